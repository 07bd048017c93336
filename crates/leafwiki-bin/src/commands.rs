use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use leafwiki_core::{Block, Body, Page, PageId, PageStore, Query};
use log::info;

use crate::cli::Cmd;

pub async fn exec(store: &PageStore, cmd: Cmd, out: &mut impl Write) -> Result<()> {
    match cmd {
        Cmd::Create {
            title,
            body_file,
            parent,
        } => {
            let body = match (body_file, title) {
                (Some(path), _) => read_body(&path)?,
                (None, Some(title)) => Body::from_blocks(vec![Block::header(&title, 2)]),
                (None, None) => Body::placeholder(),
            };

            let mut page = Page::with_body(body);
            if let Some(parent) = parent {
                let parent = existing(store, &parent).await?;
                page.set_parent(&parent);
            }

            store.save(&mut page).await?;
            info!("Created page {:?}", page.id());
            writeln!(out, "{}", serde_json::to_string_pretty(&page)?)?;
        }

        Cmd::Show { id } => {
            let page = existing(store, &id).await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&page)?)?;
        }

        Cmd::List { roots } => {
            let query = if roots { Query::Roots } else { Query::All };
            for page in store.get_all(query).await? {
                write_line(out, &page, 0)?;
            }
        }

        Cmd::Children { id } => {
            let page = existing(store, &id).await?;
            for child in store.children(&page).await? {
                write_line(out, &child, 0)?;
            }
        }

        Cmd::Ancestors { id } => {
            let page = existing(store, &id).await?;
            for ancestor in store.ancestors(&page).await? {
                write_line(out, &ancestor, 0)?;
            }
        }

        Cmd::Tree => {
            let mut stack: Vec<(Page, usize)> = store
                .get_all(Query::Roots)
                .await?
                .rev()
                .map(|page| (page, 0))
                .collect();

            while let Some((page, depth)) = stack.pop() {
                write_line(out, &page, depth)?;
                let children = store.children(&page).await?;
                stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
            }
        }

        Cmd::SetBody { id, body_file } => {
            let mut page = existing(store, &id).await?;
            page.set_body(read_body(&body_file)?);
            store.save(&mut page).await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&page)?)?;
        }

        Cmd::SetParent { id, parent, root } => {
            let mut page = existing(store, &id).await?;
            if root {
                page.set_parent_id(None);
            } else {
                let parent = parent.ok_or_else(|| anyhow!("missing parent id"))?;
                let parent = existing(store, &parent).await?;
                store.reparent(&mut page, &parent).await?;
            }
            store.save(&mut page).await?;
            writeln!(out, "{}", serde_json::to_string_pretty(&page)?)?;
        }

        Cmd::Remove { id } => {
            let mut page = existing(store, &id).await?;
            let orphans = store.children(&page).await?.len();
            store.destroy(&mut page).await?;
            writeln!(out, "removed {}", id)?;
            if orphans > 0 {
                writeln!(out, "{} child page(s) now have a dangling parent", orphans)?;
            }
        }
    }

    Ok(())
}

async fn existing(store: &PageStore, id: &str) -> Result<Page> {
    store
        .find(&PageId::from(id))
        .await?
        .ok_or_else(|| anyhow!("page {} not found", id))
}

fn read_body(path: &Path) -> Result<Body> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading body {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing body {}", path.display()))?;
    Ok(Body::from(value))
}

fn write_line(out: &mut impl Write, page: &Page, depth: usize) -> Result<()> {
    let id = page.id().map(PageId::as_str).unwrap_or("-");
    let title = if page.title().is_empty() {
        "(untitled)"
    } else {
        page.title()
    };
    writeln!(out, "{}{}\t{}", "  ".repeat(depth), id, title)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leafwiki_core::MemoryStorage;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_test_store() -> PageStore {
        PageStore::new(Arc::new(MemoryStorage::new()))
    }

    async fn run(store: &PageStore, cmd: Cmd) -> Result<String> {
        let mut out = Vec::new();
        exec(store, cmd, &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    async fn create(store: &PageStore, title: &str, parent: Option<&str>) -> String {
        let output = run(
            store,
            Cmd::Create {
                title: Some(title.to_string()),
                body_file: None,
                parent: parent.map(str::to_string),
            },
        )
        .await
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        value["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_and_show() {
        let store = create_test_store();
        let id = create(&store, "Intro", None).await;

        let output = run(&store, Cmd::Show { id: id.clone() }).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["id"], id.as_str());
        assert_eq!(value["title"], "Intro");
        assert!(value.get("parentId").is_none());
    }

    #[tokio::test]
    async fn test_create_from_body_file() {
        let store = create_test_store();
        let temp_dir = TempDir::new().unwrap();
        let body_path = temp_dir.path().join("body.json");
        std::fs::write(
            &body_path,
            r#"{"time":1,"blocks":[{"type":"paragraph","data":{"text":"x"}},{"type":"header","data":{"text":"From file","level":2}}]}"#,
        )
        .unwrap();

        let output = run(
            &store,
            Cmd::Create {
                title: Some("ignored".to_string()),
                body_file: Some(body_path),
                parent: None,
            },
        )
        .await
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["title"], "From file");
        assert_eq!(value["body"]["time"], 1);
    }

    #[tokio::test]
    async fn test_show_missing_page_fails() {
        let store = create_test_store();
        let result = run(
            &store,
            Cmd::Show {
                id: "missing".to_string(),
            },
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_tree_prints_nested_pages() {
        let store = create_test_store();
        let root = create(&store, "Root", None).await;
        let child = create(&store, "Child", Some(&root)).await;
        create(&store, "Grandchild", Some(&child)).await;
        create(&store, "Other root", None).await;

        let output = run(&store, Cmd::Tree).await.unwrap();
        let titles: Vec<&str> = output
            .lines()
            .map(|line| {
                let (prefix, title) = line.split_once('\t').unwrap();
                let depth = prefix.len() - prefix.trim_start().len();
                assert_eq!(depth % 2, 0);
                title
            })
            .collect();

        assert_eq!(titles, vec!["Root", "Child", "Grandchild", "Other root"]);
        assert!(output.lines().nth(2).unwrap().starts_with("    "));
    }

    #[tokio::test]
    async fn test_set_parent_rejects_cycle() {
        let store = create_test_store();
        let root = create(&store, "Root", None).await;
        let child = create(&store, "Child", Some(&root)).await;

        let result = run(
            &store,
            Cmd::SetParent {
                id: root.clone(),
                parent: Some(child.clone()),
                root: false,
            },
        )
        .await;
        assert!(result.is_err());

        run(
            &store,
            Cmd::SetParent {
                id: child.clone(),
                parent: None,
                root: true,
            },
        )
        .await
        .unwrap();
        let children = run(&store, Cmd::Children { id: root }).await.unwrap();
        assert!(children.is_empty());
    }

    #[tokio::test]
    async fn test_remove_reports_orphans() {
        let store = create_test_store();
        let root = create(&store, "Root", None).await;
        create(&store, "Child", Some(&root)).await;

        let output = run(&store, Cmd::Remove { id: root.clone() }).await.unwrap();
        assert!(output.contains("1 child page(s)"));
        assert!(run(&store, Cmd::Show { id: root }).await.is_err());
    }
}
