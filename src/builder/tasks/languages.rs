use super::{parse_declaration, take_declarations, take_included};
use crate::builder::{BuildContext, Task};
use crate::error::Result;
use crate::files::VirtualFile;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Merges translations into `assets/<ns>/lang/<code>.json`.
///
/// Global translations from the build config go to every configured language
/// in the `minecraft` namespace. `content/<ns>/**/<code>.lang.json` files go
/// to their own namespace, with `<namespace>` in keys expanded.
#[derive(Debug, Default)]
pub struct ProcessLanguages;

impl Task for ProcessLanguages {
    fn run(&self, ctx: &mut BuildContext<'_>) -> Result<()> {
        let project = ctx.project;
        let config = &project.config;
        let mut languages: BTreeMap<String, Map<String, Value>> = BTreeMap::new();

        if !config.all_lang_translations.is_empty() {
            for language in &config.languages {
                let translations = languages
                    .entry(format!("assets/minecraft/lang/{}.json", language))
                    .or_default();
                for (key, value) in &config.all_lang_translations {
                    translations.insert(key.clone(), Value::String(value.clone()));
                }
            }
        }

        for (path, file) in take_declarations(&mut ctx.files, ".lang.json")? {
            let entries: BTreeMap<String, String> = parse_declaration(&file)?;
            let code = path.file_name();
            let translations = languages
                .entry(format!("assets/{}/lang/{}.json", path.namespace(), code))
                .or_default();
            for (key, value) in entries {
                translations.insert(key.replace("<namespace>", path.namespace()), Value::String(value));
            }
        }

        for (target, translations) in languages {
            let mut merged = match take_included(&mut ctx.files, &target) {
                Some(file) => parse_declaration::<Map<String, Value>>(&file)?,
                None => Map::new(),
            };
            merged.extend(translations);
            ctx.files.insert_file(VirtualFile::json(&target, Value::Object(merged)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tasks::test_support::{context, demo_project};
    use crate::project::BuildConfig;
    use serde_json::json;

    #[test]
    fn test_merges_translations() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BuildConfig::default().with_translation("pack.name", "Demo");
        config.languages.insert("de_de".to_string());
        let project = demo_project(dir.path()).with_config(config);
        let mut ctx = context(&project);
        ctx.files
            .add_file(VirtualFile::json(
                "content/demo/lang/en_us.lang.json",
                json!({ "item.<namespace>.custom_stick": "Custom Stick" }),
            ))
            .unwrap();
        ctx.files
            .add_file(VirtualFile::json(
                "include/assets/minecraft/lang/en_us.json",
                json!({ "existing": "kept" }),
            ))
            .unwrap();

        ProcessLanguages.run(&mut ctx).unwrap();

        let demo = ctx.files.get_file("assets/demo/lang/en_us.json").unwrap().as_json().unwrap();
        assert_eq!(demo["item.demo.custom_stick"], "Custom Stick");

        let en = ctx.files.get_file("assets/minecraft/lang/en_us.json").unwrap().as_json().unwrap();
        assert_eq!(en["pack.name"], "Demo");
        assert_eq!(en["existing"], "kept");
        let de = ctx.files.get_file("assets/minecraft/lang/de_de.json").unwrap().as_json().unwrap();
        assert_eq!(de["pack.name"], "Demo");
        assert!(!ctx.files.contains("content/demo/lang/en_us.lang.json"));
    }

    #[test]
    fn test_non_string_translation_fails() {
        let dir = tempfile::tempdir().unwrap();
        let project = demo_project(dir.path());
        let mut ctx = context(&project);
        ctx.files
            .add_file(VirtualFile::json("content/demo/lang/en_us.lang.json", json!({ "key": 1 })))
            .unwrap();
        assert!(ProcessLanguages.run(&mut ctx).is_err());
    }
}
