//! In-memory filesystem implementation
//!
//! A tree of nodes held in a slab arena, keyed by index. Each node carries
//! an owner and a permission mode; system-seeded nodes belong to `root` and
//! refuse mutation from the (single) regular user. Data lives only as long
//! as the page; hosts persist it through [`FsSnapshot`].

use super::{DirEntry, NodeInfo, Vfs, VfsError, normalize, split_parent};
use serde::{Deserialize, Serialize};
use slab::Slab;

const ROOT_OWNER: &str = "root";
const USER_OWNER: &str = "user";

const DIR_MODE: u16 = 0o755;
const FILE_MODE: u16 = 0o644;

#[derive(Debug, Clone)]
enum NodeKind {
    File { content: String },
    Directory { children: Vec<usize> },
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<usize>,
    kind: NodeKind,
    owner: String,
    mode: u16,
}

impl Node {
    fn dir(name: &str, owner: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            kind: NodeKind::Directory {
                children: Vec::new(),
            },
            owner: owner.to_string(),
            mode: DIR_MODE,
        }
    }

    fn file(name: &str, owner: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            kind: NodeKind::File {
                content: content.to_string(),
            },
            owner: owner.to_string(),
            mode: FILE_MODE,
        }
    }

    fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }
}

/// In-memory filesystem
pub struct MemoryFs {
    nodes: Slab<Node>,
    root: usize,
}

impl MemoryFs {
    /// A filesystem with the standard seeded tree.
    pub fn new() -> Self {
        let mut fs = Self::empty();
        fs.seed();
        fs
    }

    /// Just the root directory.
    fn empty() -> Self {
        let mut nodes = Slab::new();
        let root = nodes.insert(Node::dir("", ROOT_OWNER));
        Self { nodes, root }
    }

    fn seed(&mut self) {
        self.insert_unchecked(self.root, Node::dir("bin", ROOT_OWNER));
        let etc = self.insert_unchecked(self.root, Node::dir("etc", ROOT_OWNER));
        self.insert_unchecked(etc, Node::file("motd", ROOT_OWNER, "Welcome to webtop.\n"));
        let home = self.insert_unchecked(self.root, Node::dir("home", ROOT_OWNER));
        let user = self.insert_unchecked(home, Node::dir("user", USER_OWNER));
        let docs = self.insert_unchecked(user, Node::dir("documents", USER_OWNER));
        self.insert_unchecked(
            docs,
            Node::file(
                "readme.txt",
                USER_OWNER,
                "This filesystem lives in memory.\nAnything you create vanishes on reload unless the desktop saves a snapshot.",
            ),
        );
        self.insert_unchecked(
            user,
            Node::file(
                "notes.txt",
                USER_OWNER,
                "things to try\ncat notes.txt | sort\nexport GREETING=hi",
            ),
        );
    }

    /// Insert a node under `parent` without permission checks (seeding,
    /// snapshot restore).
    fn insert_unchecked(&mut self, parent: usize, mut node: Node) -> usize {
        node.parent = Some(parent);
        let id = self.nodes.insert(node);
        if let NodeKind::Directory { children } = &mut self.nodes[parent].kind {
            children.push(id);
        }
        id
    }

    fn child_of(&self, dir: usize, name: &str) -> Option<usize> {
        match &self.nodes[dir].kind {
            NodeKind::Directory { children } => children
                .iter()
                .copied()
                .find(|&id| self.nodes[id].name == name),
            NodeKind::File { .. } => None,
        }
    }

    fn lookup(&self, path: &str) -> Option<usize> {
        let path = normalize(path);
        let mut current = self.root;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current = self.child_of(current, component)?;
        }
        Some(current)
    }

    /// The single regular user may mutate a node it owns (owner write bit)
    /// or one that is world-writable.
    fn writable(&self, id: usize) -> bool {
        let node = &self.nodes[id];
        (node.owner == USER_OWNER && node.mode & 0o200 != 0) || node.mode & 0o002 != 0
    }

    fn detach_from_parent(&mut self, id: usize) {
        if let Some(parent) = self.nodes[id].parent {
            if let NodeKind::Directory { children } = &mut self.nodes[parent].kind {
                children.retain(|&c| c != id);
            }
        }
    }

    /// Serialize the whole tree for host-side persistence.
    pub fn snapshot(&self) -> FsSnapshot {
        let mut nodes = Vec::new();
        self.collect_snapshot(self.root, "", &mut nodes);
        FsSnapshot { nodes }
    }

    fn collect_snapshot(&self, id: usize, path: &str, out: &mut Vec<SnapshotNode>) {
        let node = &self.nodes[id];
        let full = if id == self.root {
            "/".to_string()
        } else {
            format!("{}/{}", if path == "/" { "" } else { path }, node.name)
        };
        out.push(SnapshotNode {
            path: full.clone(),
            is_dir: node.is_dir(),
            content: match &node.kind {
                NodeKind::File { content } => content.clone(),
                NodeKind::Directory { .. } => String::new(),
            },
            owner: node.owner.clone(),
            mode: node.mode,
        });
        if let NodeKind::Directory { children } = &node.kind {
            // Stable snapshot order
            let mut sorted = children.clone();
            sorted.sort_by(|&a, &b| self.nodes[a].name.cmp(&self.nodes[b].name));
            for child in sorted {
                self.collect_snapshot(child, &full, out);
            }
        }
    }

    /// Rebuild a filesystem from a snapshot. Entries whose parent is
    /// missing are skipped rather than failing the whole restore.
    pub fn from_snapshot(snapshot: &FsSnapshot) -> Self {
        let mut fs = Self::empty();
        let mut entries: Vec<&SnapshotNode> = snapshot.nodes.iter().collect();
        // Parents sort before children once ordered by component count
        entries.sort_by_key(|n| (n.path.matches('/').count(), n.path.clone()));
        for entry in entries {
            let path = normalize(&entry.path);
            if path == "/" {
                fs.nodes[fs.root].owner = entry.owner.clone();
                fs.nodes[fs.root].mode = entry.mode;
                continue;
            }
            let (parent, name) = split_parent(&path);
            let Some(parent_id) = fs.lookup(&parent) else {
                continue;
            };
            if !fs.nodes[parent_id].is_dir() || fs.child_of(parent_id, &name).is_some() {
                continue;
            }
            let mut node = if entry.is_dir {
                Node::dir(&name, &entry.owner)
            } else {
                Node::file(&name, &entry.owner, &entry.content)
            };
            node.mode = entry.mode;
            fs.insert_unchecked(parent_id, node);
        }
        fs
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs for MemoryFs {
    fn navigate_to(&self, path: &str) -> Result<(), VfsError> {
        match self.lookup(path) {
            Some(id) if self.nodes[id].is_dir() => Ok(()),
            Some(_) => Err(VfsError::NotADirectory),
            None => Err(VfsError::NotFound),
        }
    }

    fn resolve(&self, path: &str) -> Option<NodeInfo> {
        let id = self.lookup(path)?;
        let node = &self.nodes[id];
        Some(NodeInfo {
            name: node.name.clone(),
            is_dir: node.is_dir(),
            size: match &node.kind {
                NodeKind::File { content } => content.len(),
                NodeKind::Directory { children } => children.len(),
            },
            owner: node.owner.clone(),
            mode: node.mode,
        })
    }

    fn read(&self, path: &str) -> Result<String, VfsError> {
        match self.lookup(path) {
            Some(id) => match &self.nodes[id].kind {
                NodeKind::File { content } => Ok(content.clone()),
                NodeKind::Directory { .. } => Err(VfsError::IsADirectory),
            },
            None => Err(VfsError::NotFound),
        }
    }

    fn write(&mut self, parent: &str, name: &str, content: &str) -> Result<(), VfsError> {
        let parent_id = self.lookup(parent).ok_or(VfsError::NotFound)?;
        if !self.nodes[parent_id].is_dir() {
            return Err(VfsError::NotADirectory);
        }
        match self.child_of(parent_id, name) {
            Some(existing) => {
                if !self.writable(existing) {
                    return Err(VfsError::PermissionDenied);
                }
                match &mut self.nodes[existing].kind {
                    NodeKind::File { content: current } => {
                        *current = content.to_string();
                        Ok(())
                    }
                    NodeKind::Directory { .. } => Err(VfsError::IsADirectory),
                }
            }
            None => {
                if !self.writable(parent_id) {
                    return Err(VfsError::PermissionDenied);
                }
                let node = Node::file(name, USER_OWNER, content);
                self.insert_unchecked(parent_id, node);
                Ok(())
            }
        }
    }

    fn update_content(&mut self, path: &str, content: &str) -> Result<(), VfsError> {
        let id = self.lookup(path).ok_or(VfsError::NotFound)?;
        if !self.writable(id) {
            return Err(VfsError::PermissionDenied);
        }
        match &mut self.nodes[id].kind {
            NodeKind::File { content: current } => {
                *current = content.to_string();
                Ok(())
            }
            NodeKind::Directory { .. } => Err(VfsError::IsADirectory),
        }
    }

    fn create_dir(&mut self, parent: &str, name: &str) -> Result<(), VfsError> {
        let parent_id = self.lookup(parent).ok_or(VfsError::NotFound)?;
        if !self.nodes[parent_id].is_dir() {
            return Err(VfsError::NotADirectory);
        }
        if self.child_of(parent_id, name).is_some() {
            return Err(VfsError::AlreadyExists);
        }
        if !self.writable(parent_id) {
            return Err(VfsError::PermissionDenied);
        }
        let node = Node::dir(name, USER_OWNER);
        self.insert_unchecked(parent_id, node);
        Ok(())
    }

    fn list(&self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        let id = self.lookup(path).ok_or(VfsError::NotFound)?;
        let children = match &self.nodes[id].kind {
            NodeKind::Directory { children } => children,
            NodeKind::File { .. } => return Err(VfsError::NotADirectory),
        };
        let mut entries: Vec<DirEntry> = children
            .iter()
            .map(|&child| DirEntry {
                name: self.nodes[child].name.clone(),
                is_dir: self.nodes[child].is_dir(),
            })
            .collect();
        // Directories first, then lexicographic by name
        entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then(a.name.cmp(&b.name)));
        Ok(entries)
    }

    fn remove(&mut self, path: &str) -> Result<(), VfsError> {
        let id = self.lookup(path).ok_or(VfsError::NotFound)?;
        if id == self.root {
            return Err(VfsError::PermissionDenied);
        }
        if !self.writable(id) {
            return Err(VfsError::PermissionDenied);
        }
        if let NodeKind::Directory { children } = &self.nodes[id].kind {
            if !children.is_empty() {
                return Err(VfsError::DirectoryNotEmpty);
            }
        }
        self.detach_from_parent(id);
        self.nodes.remove(id);
        Ok(())
    }
}

/// Serializable image of the whole tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsSnapshot {
    pub nodes: Vec<SnapshotNode>,
}

/// One node in a snapshot, addressed by absolute path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub path: String,
    pub is_dir: bool,
    #[serde(default)]
    pub content: String,
    pub owner: String,
    pub mode: u16,
}

impl FsSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
