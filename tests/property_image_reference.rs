use ecs_deploy::adapters::mock::task_definition;
use ecs_deploy::domain::models::{EnvOverride, EnvOverrides, ImageReference, TaskDefinitionDraft};
use proptest::prelude::*;
use std::collections::HashSet;

fn repository() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9][a-z0-9_.-]{0,10}", 1..4).prop_map(|parts| parts.join("/"))
}

fn tag() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_][A-Za-z0-9_.-]{0,15}"
}

fn env_entries() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[A-Z][A-Z0-9_]{0,6}", "[a-z0-9]{0,6}"), 0..12)
}

proptest! {
    /// Property: identity ignores the tag
    #[test]
    fn prop_identity_ignores_tag(repo in repository(), a in tag(), b in tag()) {
        let first = ImageReference::parse(&format!("{repo}:{a}"));
        let second = ImageReference::parse(&format!("{repo}:{b}"));

        prop_assert_eq!(&first.identity, &repo);
        prop_assert_eq!(&first.identity, &second.identity);
        prop_assert!(first.same_family(&second));
        prop_assert_eq!(first.tag, a);
    }

    /// Property: untagged locators are their own identity
    #[test]
    fn prop_untagged_identity_is_input(repo in repository()) {
        let image = ImageReference::parse(&repo);

        prop_assert_eq!(&image.identity, &repo);
        prop_assert_eq!(image.tag, "");
    }

    /// Property: a registry port is never mistaken for a tag
    #[test]
    fn prop_registry_port_stays_in_identity(
        port in 1u16..,
        repo in repository(),
        t in tag(),
    ) {
        let raw = format!("registry.local:{port}/{repo}:{t}");
        let image = ImageReference::parse(&raw);

        prop_assert_eq!(image.identity, format!("registry.local:{port}/{repo}"));
        prop_assert_eq!(image.tag, t);
        prop_assert_eq!(image.raw, raw);
    }

    /// Property: applying overrides is idempotent and never duplicates names
    #[test]
    fn prop_env_upsert_is_idempotent(existing in env_entries(), overrides in env_entries()) {
        let overrides: EnvOverrides = overrides
            .iter()
            .map(|(name, value)| EnvOverride::new(name.clone(), value.clone()))
            .collect();
        let mut environment: Vec<EnvOverride> = Vec::new();
        for (name, value) in &existing {
            if !environment.iter().any(|e| &e.name == name) {
                environment.push(EnvOverride::new(name.clone(), value.clone()));
            }
        }

        let mut once = environment.clone();
        overrides.apply_to(&mut once);
        let mut twice = once.clone();
        overrides.apply_to(&mut twice);

        prop_assert_eq!(&once, &twice);

        let names: HashSet<&str> = once.iter().map(|e| e.name.as_str()).collect();
        prop_assert_eq!(names.len(), once.len());
        for entry in overrides.iter() {
            let applied = once.iter().find(|e| e.name == entry.name).map(|e| e.value.as_str());
            prop_assert_eq!(applied, Some(entry.value.as_str()));
        }
    }

    /// Property: building a draft never mutates the template
    #[test]
    fn prop_build_leaves_template_untouched(repo in repository(), old in tag(), new in tag()) {
        let current = format!("{repo}:{old}");
        let template = task_definition(
            "arn:aws:ecs:us-east-1:000000000000:task-definition/web:3",
            "web",
            &[("app", current.as_str()), ("sidecar", "busybox:latest")],
        );
        let before = template.clone();
        let image = ImageReference::parse(&format!("{repo}:{new}"));

        let draft = TaskDefinitionDraft::build(&template, &image, &EnvOverrides::new());

        prop_assert_eq!(&template, &before);
        let draft = draft.unwrap();
        prop_assert_eq!(&draft.container_definitions[0].image, &image.raw);
        prop_assert_eq!(draft.family, template.family);
    }
}
