//! Parent-pointer folder tree: child listing, root-first paths, and the
//! ancestor walk that keeps moves acyclic.
//!
//! Every walk is bounded by the number of folders so a cycle that slipped into
//! persisted data (hand-edited file, old import) can never hang a caller.

use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;

use crate::domain::folder::Folder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderError {
    NotFound(String),
    Cycle { folder: String, target: String },
}

impl fmt::Display for FolderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderError::NotFound(id) => write!(f, "folder '{}' not found", id),
            FolderError::Cycle { folder, target } => write!(
                f,
                "cannot move folder '{}' into '{}': that is the folder or one of its subfolders",
                folder, target
            ),
        }
    }
}

impl Error for FolderError {}

pub fn find<'a>(folders: &'a [Folder], id: &str) -> Option<&'a Folder> {
    folders.iter().find(|folder| folder.id == id)
}

/// Lenient read of a folder reference: a dangling id reads as "no folder".
pub fn resolve<'a>(folders: &'a [Folder], id: Option<&str>) -> Option<&'a Folder> {
    id.and_then(|id| find(folders, id))
}

pub fn list_children<'a>(folders: &'a [Folder], parent_id: Option<&str>) -> Vec<&'a Folder> {
    let mut children = folders
        .iter()
        .filter(|folder| folder.parent_id.as_deref() == parent_id)
        .collect::<Vec<_>>();
    children.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    children
}

pub fn path_to<'a>(folders: &'a [Folder], folder_id: &str) -> Vec<&'a Folder> {
    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = find(folders, folder_id);
    while let Some(folder) = cursor {
        if path.len() >= folders.len() || !seen.insert(folder.id.as_str()) {
            break;
        }
        path.push(folder);
        cursor = resolve(folders, folder.parent_id.as_deref());
    }
    path.reverse();
    path
}

pub fn display_path(folders: &[Folder], folder_id: &str) -> String {
    path_to(folders, folder_id)
        .iter()
        .map(|folder| folder.name.as_str())
        .collect::<Vec<_>>()
        .join(" > ")
}

/// True when `candidate` is `ancestor` itself or sits somewhere below it.
/// Missing ancestors and an exhausted walk both answer `false`.
pub fn is_self_or_descendant(folders: &[Folder], candidate: &str, ancestor: &str) -> bool {
    let mut current = Some(candidate);
    for _ in 0..=folders.len() {
        let Some(id) = current else {
            return false;
        };
        if id == ancestor {
            return true;
        }
        current = find(folders, id).and_then(|folder| folder.parent_id.as_deref());
    }
    false
}

pub fn check_move(
    folders: &[Folder],
    folder_id: &str,
    new_parent_id: Option<&str>,
) -> Result<(), FolderError> {
    if find(folders, folder_id).is_none() {
        return Err(FolderError::NotFound(folder_id.to_string()));
    }
    let Some(target) = new_parent_id else {
        return Ok(());
    };
    if target != folder_id && find(folders, target).is_none() {
        return Err(FolderError::NotFound(target.to_string()));
    }
    if is_self_or_descendant(folders, target, folder_id) {
        return Err(FolderError::Cycle {
            folder: folder_id.to_string(),
            target: target.to_string(),
        });
    }
    Ok(())
}

pub fn move_folder(
    folders: &mut [Folder],
    folder_id: &str,
    new_parent_id: Option<&str>,
) -> Result<(), FolderError> {
    check_move(folders, folder_id, new_parent_id)?;
    let moved = folders.iter_mut().find(|folder| folder.id == folder_id);
    if let Some(folder) = moved {
        folder.parent_id = new_parent_id.map(str::to_string);
    }
    Ok(())
}

/// Removes a folder and hands its direct children to the removed folder's
/// parent. Routines pointing at it are left alone.
pub fn remove_folder(folders: &mut Vec<Folder>, folder_id: &str) -> Result<Folder, FolderError> {
    let index = folders
        .iter()
        .position(|folder| folder.id == folder_id)
        .ok_or_else(|| FolderError::NotFound(folder_id.to_string()))?;
    let removed = folders.remove(index);
    for child in folders
        .iter_mut()
        .filter(|folder| folder.parent_id.as_deref() == Some(folder_id))
    {
        child.parent_id = removed.parent_id.clone();
    }
    Ok(removed)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow<'a> {
    pub depth: usize,
    pub folder: &'a Folder,
}

/// Depth-first, name-ordered rows for display. Folders whose parent is
/// missing start their own root; folders caught in a stored cycle are
/// appended at depth zero.
pub fn flatten_tree(folders: &[Folder]) -> Vec<TreeRow<'_>> {
    let ids: HashSet<&str> = folders.iter().map(|folder| folder.id.as_str()).collect();
    let mut children_by_parent: HashMap<Option<&str>, Vec<&Folder>> = HashMap::new();
    for folder in folders {
        let parent = folder
            .parent_id
            .as_deref()
            .filter(|parent| ids.contains(parent) && *parent != folder.id);
        children_by_parent.entry(parent).or_default().push(folder);
    }
    for children in children_by_parent.values_mut() {
        children.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    }

    let mut rows = Vec::with_capacity(folders.len());
    let mut visited = HashSet::new();
    let roots = children_by_parent.get(&None).cloned().unwrap_or_default();
    for root in roots {
        push_rows(root, 0, &children_by_parent, &mut visited, &mut rows);
    }
    for folder in folders {
        if !visited.contains(folder.id.as_str()) {
            push_rows(folder, 0, &children_by_parent, &mut visited, &mut rows);
        }
    }
    rows
}

fn push_rows<'a>(
    folder: &'a Folder,
    depth: usize,
    children_by_parent: &HashMap<Option<&str>, Vec<&'a Folder>>,
    visited: &mut HashSet<&'a str>,
    rows: &mut Vec<TreeRow<'a>>,
) {
    if !visited.insert(folder.id.as_str()) {
        return;
    }
    rows.push(TreeRow { depth, folder });
    if let Some(children) = children_by_parent.get(&Some(folder.id.as_str())) {
        for child in children {
            push_rows(child, depth + 1, children_by_parent, visited, rows);
        }
    }
}
