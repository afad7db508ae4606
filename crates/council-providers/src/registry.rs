//! Provider Registry (§4.2): discovers registered adapters and resolves a
//! role's provider list under the preference rules in spec.md §4.2.

use std::collections::HashMap;
use std::sync::Arc;

use council_config::{ProviderSelection, RoleConfig};
use council_core::error::{CouncilError, ProviderResolutionError};

use crate::types::ProviderAdapter;

/// Read-only-after-init registry of provider adapters, addressable by
/// name only (§9 "No hidden global state": this is constructed once by
/// the facade from explicit `register` calls, never a global singleton).
#[derive(Default)]
pub struct ProviderRegistry {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.name().to_string(), adapter);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(name).cloned()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ProviderAdapter>)> {
        self.adapters.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve the providers a role should run on.
    ///
    /// 1. If `explicit` is given, use it verbatim.
    /// 2. Otherwise take `role.providers.preferred`, drop anything in
    ///    `exclude`, then append `fallback` entries not already present.
    /// 3. In strict mode (role's own `providers.strict`, overridable by the
    ///    caller), a name that fails to resolve fails the whole
    ///    resolution; otherwise it's skipped and resolution continues with
    ///    the remainder.
    pub fn resolve_for_role(
        &self,
        role_name: &str,
        role: &RoleConfig,
        explicit: Option<&[String]>,
        strict_override: Option<bool>,
    ) -> Result<Vec<Arc<dyn ProviderAdapter>>, CouncilError> {
        let strict = strict_override.unwrap_or(role.providers.strict);
        let ordered = explicit
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| ordered_preference_list(&role.providers));

        let mut resolved = Vec::with_capacity(ordered.len());
        for name in &ordered {
            match self.get(name) {
                Some(adapter) => resolved.push(adapter),
                None if strict => {
                    return Err(ProviderResolutionError::NotRegistered(name.clone()).into());
                }
                None => continue,
            }
        }

        if resolved.is_empty() {
            return Err(ProviderResolutionError::NoProvidersResolved {
                role: role_name.to_string(),
            }
            .into());
        }

        Ok(resolved)
    }
}

/// `preferred` minus `exclude`, followed by `fallback` entries not already
/// present in that filtered list.
fn ordered_preference_list(selection: &ProviderSelection) -> Vec<String> {
    let mut ordered: Vec<String> = selection
        .preferred
        .iter()
        .filter(|p| !selection.exclude.contains(p))
        .cloned()
        .collect();

    for fallback in &selection.fallback {
        if !ordered.contains(fallback) && !selection.exclude.contains(fallback) {
            ordered.push(fallback.clone());
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        DoctorReport, GenerateRequest, GenerateResponse, ProviderCapabilities,
    };
    use async_trait::async_trait;

    struct StubAdapter(&'static str);

    #[async_trait]
    impl ProviderAdapter for StubAdapter {
        fn name(&self) -> &str {
            self.0
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                streaming: false,
                tool_use: false,
                structured_output: true,
                multimodal: false,
                max_output_tokens: 4096,
            }
        }

        async fn generate(
            &self,
            _request: GenerateRequest,
        ) -> Result<GenerateResponse, CouncilError> {
            unimplemented!("stub")
        }

        async fn doctor(&self) -> DoctorReport {
            DoctorReport::ok("stub", 0)
        }
    }

    fn registry_with(names: &[&'static str]) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for name in names {
            registry.register(Arc::new(StubAdapter(name)));
        }
        registry
    }

    fn role_with(preferred: &[&str], fallback: &[&str], exclude: &[&str], strict: bool) -> RoleConfig {
        let mut role = RoleConfig::default();
        role.providers.preferred = preferred.iter().map(|s| s.to_string()).collect();
        role.providers.fallback = fallback.iter().map(|s| s.to_string()).collect();
        role.providers.exclude = exclude.iter().map(|s| s.to_string()).collect();
        role.providers.strict = strict;
        role
    }

    #[test]
    fn explicit_list_used_verbatim() {
        let registry = registry_with(&["a", "b"]);
        let role = role_with(&["a"], &[], &[], false);
        let explicit = vec!["b".to_string()];
        let resolved = registry
            .resolve_for_role("drafter", &role, Some(&explicit), None)
            .unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name(), "b");
    }

    #[test]
    fn preferred_minus_exclude_plus_fallback() {
        let registry = registry_with(&["a", "b", "c"]);
        let role = role_with(&["a", "b"], &["c"], &["b"], false);
        let resolved = registry
            .resolve_for_role("drafter", &role, None, None)
            .unwrap();
        let names: Vec<&str> = resolved.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn strict_mode_fails_on_unregistered_provider() {
        let registry = registry_with(&["a"]);
        let role = role_with(&["a", "missing"], &[], &[], true);
        let result = registry.resolve_for_role("drafter", &role, None, None);
        assert!(result.is_err());
    }

    #[test]
    fn non_strict_mode_skips_unregistered_provider() {
        let registry = registry_with(&["a"]);
        let role = role_with(&["a", "missing"], &[], &[], false);
        let resolved = registry
            .resolve_for_role("drafter", &role, None, None)
            .unwrap();
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn no_providers_resolved_is_an_error() {
        let registry = registry_with(&["a"]);
        let role = role_with(&["missing"], &[], &[], false);
        let result = registry.resolve_for_role("drafter", &role, None, None);
        assert!(result.is_err());
    }
}
