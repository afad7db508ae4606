//! The Council Deliberation Protocol: fixed text appended to every
//! resolved role's system prompt (§4.4), not configurable.

/// Appended verbatim to every role's composed system prompt.
pub const COUNCIL_PROTOCOL: &str = "\
All participants hold equal standing in this deliberation; no role's \
output outranks another's by default. Constructive dissent is expected \
and should be stated plainly rather than softened. If a participant has \
no objection, say PASS rather than manufacturing agreement. Treat other \
participants' drafts as a collaborator would treat a rival's best \
attempt: engage with its strongest form, not a weaker paraphrase of it. \
Every claim of fact or defect must be backed by evidence drawn from the \
task or the drafts under review, not asserted on authority alone.";
