#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use promptverse_shared::{NewCategory, NewPrompt};
use promptverse_store::{NoFixtures, Session, Store};

/// An initialized in-memory store with no fixtures.
pub async fn empty_store() -> Store {
    let store = Store::in_memory(Arc::new(NoFixtures)).unwrap();
    store.initialize().await.unwrap();
    store
}

pub fn session(user_id: &str) -> Session {
    Session::new(user_id)
}

pub fn new_prompt(title: &str, category_id: Option<&str>, subcategory_id: Option<&str>) -> NewPrompt {
    NewPrompt {
        title: title.to_string(),
        content: format!("{title} content"),
        description: None,
        category_id: category_id.map(str::to_string),
        subcategory_id: subcategory_id.map(str::to_string),
        tags: Vec::new(),
        difficulty: None,
        license: None,
        allow_edits: None,
        allow_comments: None,
        show_author: None,
    }
}

pub fn new_category(name: &str, subcategories: &[&str]) -> NewCategory {
    NewCategory {
        name: name.to_string(),
        description: format!("{name} prompts"),
        icon: None,
        color: None,
        tags: Vec::new(),
        subcategories: subcategories.iter().map(|s| s.to_string()).collect(),
    }
}

/// Writes `<name>.json` files into `dir`.
pub fn write_fixtures(dir: &Path, files: &[(&str, &str)]) {
    for (name, body) in files {
        std::fs::write(dir.join(format!("{name}.json")), body).unwrap();
    }
}
