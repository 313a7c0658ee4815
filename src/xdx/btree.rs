//! The XDX B-tree index engine: create/open/insert/delete/seek/reindex.
//!
//! Node splitting/insert descends from the root keeping an explicit path
//! stack of `(node_offset, entry_index)` pairs and cascades the split
//! upward along that stack, rather than restarting the whole insert from
//! the root after a single-level split.

use crate::dbf::Dbf;
use crate::error::{ErrorKind, XbaseError, XbaseResult};
use crate::xdx::comparator;
use crate::xdx::header::{self, xdx_header, KeyType, FLAG_DESCENDING, FLAG_UNIQUE};
use crate::xdx::node::{self, create_node, read_node, write_node, Entry, Node};
use log::{debug, trace};
use std::cmp::Ordering;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub struct Xdx {
    file: File,
    path: PathBuf,
    pub key_type: KeyType,
    pub key_length: u16,
    pub order: u16,
    pub unique: bool,
    pub descending: bool,
    pub key_expr: String,
    root_offset: u32,
    node_count: u32,
    header_dirty: bool,

    found: bool,
    current_recno: u32,
}

fn pad_key_expr(expr: &str) -> [u8; header::KEY_EXPR_LEN] {
    let mut buf = [0u8; header::KEY_EXPR_LEN];
    let bytes = expr.as_bytes();
    let n = bytes.len().min(header::KEY_EXPR_LEN - 1);
    buf[..n].copy_from_slice(&bytes[..n]);
    buf
}

fn read_key_expr(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).to_string()
}

impl Xdx {
    pub fn create(
        path: impl AsRef<Path>,
        key_expr: &str,
        key_type: KeyType,
        key_length: u16,
        unique: bool,
        descending: bool,
    ) -> XbaseResult<Xdx> {
        if key_length == 0 || key_length as usize > header::KEY_EXPR_LEN {
            return Err(XbaseError::new(ErrorKind::InvalidIndex, "key length out of range"));
        }
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| XbaseError::with_source(ErrorKind::FileCreate, "creating XDX", e))?;

        let order = header::DEFAULT_ORDER;
        // Reserve the header region, then allocate the root leaf right
        // after it.
        file.set_len(header::HEADER_SIZE as u64)?;
        file.seek(SeekFrom::Start(header::HEADER_SIZE as u64))?;
        let root_offset = create_node(&mut file, true, order, key_length)?;

        let mut flags = 0u8;
        if unique {
            flags |= FLAG_UNIQUE;
        }
        if descending {
            flags |= FLAG_DESCENDING;
        }

        let mut xdx = Xdx {
            file,
            path,
            key_type,
            key_length,
            order,
            unique,
            descending,
            key_expr: key_expr.to_string(),
            root_offset,
            node_count: 1,
            header_dirty: true,
            found: false,
            current_recno: 0,
        };
        xdx.write_header()?;
        debug!("created XDX index at {}", xdx.path.display());
        Ok(xdx)
    }

    pub fn open(path: impl AsRef<Path>) -> XbaseResult<Xdx> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    XbaseError::new(ErrorKind::FileNotFound, format!("{}", path.display()))
                } else {
                    XbaseError::with_source(ErrorKind::FileRead, "opening XDX", e)
                }
            })?;

        let mut buf = [0u8; header::HEADER_SIZE];
        file.read_exact(&mut buf)?;
        let view = xdx_header::View::new(&buf);
        if view.magic().read() != header::MAGIC {
            return Err(XbaseError::new(ErrorKind::InvalidIndex, "bad XDX magic"));
        }
        let key_type = KeyType::from_code(view.key_type().read())
            .ok_or_else(|| XbaseError::new(ErrorKind::InvalidIndex, "bad key type byte"))?;
        let key_length = view.key_length().read();
        let root_offset = view.root_offset().read();
        let node_count = view.node_count().read();
        let order = view.order().read();
        let flags = view.flags().read();
        let key_expr = read_key_expr(view.key_expr());

        debug!("opened XDX index at {}", path.display());
        Ok(Xdx {
            file,
            path,
            key_type,
            key_length,
            order,
            unique: flags & FLAG_UNIQUE != 0,
            descending: flags & FLAG_DESCENDING != 0,
            key_expr,
            root_offset,
            node_count,
            header_dirty: false,
            found: false,
            current_recno: 0,
        })
    }

    fn write_header(&mut self) -> XbaseResult<()> {
        let mut buf = [0u8; header::HEADER_SIZE];
        {
            let mut view = xdx_header::View::new(&mut buf);
            view.magic_mut().copy_from_slice(&header::MAGIC);
            view.version_mut().write(header::VERSION);
            view.key_type_mut().write(self.key_type.code());
            view.key_length_mut().write(self.key_length);
            view.root_offset_mut().write(self.root_offset);
            view.node_count_mut().write(self.node_count);
            view.order_mut().write(self.order);
            let mut flags = 0u8;
            if self.unique {
                flags |= FLAG_UNIQUE;
            }
            if self.descending {
                flags |= FLAG_DESCENDING;
            }
            view.flags_mut().write(flags);
            view.key_expr_mut().copy_from_slice(&pad_key_expr(&self.key_expr));
        }
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&buf)?;
        self.file.flush()?;
        self.header_dirty = false;
        Ok(())
    }

    pub fn close(&mut self) -> XbaseResult<()> {
        self.flush()
    }

    pub fn flush(&mut self) -> XbaseResult<()> {
        if self.header_dirty {
            self.write_header()?;
        }
        self.file.flush()?;
        Ok(())
    }

    fn read(&mut self, offset: u32) -> XbaseResult<Node> {
        read_node(&mut self.file, offset, self.key_length)
    }

    fn write(&mut self, node: &Node) -> XbaseResult<()> {
        write_node(&mut self.file, node)
    }

    fn cmp(&self, a: &[u8], b: &[u8]) -> Ordering {
        comparator::compare(self.key_type, self.descending, a, b)
    }

    fn find_key_pos(&self, node: &Node, key: &[u8]) -> usize {
        let mut left = 0usize;
        let mut right = node.entries.len();
        while left < right {
            let mid = (left + right) / 2;
            match self.cmp(key, &node.entries[mid].key) {
                Ordering::Equal => return mid,
                Ordering::Less => right = mid,
                Ordering::Greater => left = mid + 1,
            }
        }
        left
    }

    fn child_at(&self, node: &Node, pos: usize) -> u32 {
        if pos < node.entries.len() {
            node.entries[pos].child_offset
        } else {
            node.right_child
        }
    }

    pub fn key_expr(&self) -> &str {
        &self.key_expr
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }

    pub fn found(&self) -> bool {
        self.found
    }

    pub fn recno(&self) -> u32 {
        self.current_recno
    }

    /// True if `key` matches the entry at `pos` in `node` (`pos` from
    /// `find_key_pos`). Since a leaf split copies its median key up as a
    /// separator, an internal-node exact match means the real leaf entry
    /// lives in the subtree to the *right* of that separator, not the left
    /// one `child_at` would pick by default — `descend_pos` below routes
    /// there.
    fn exact_at(&self, node: &Node, pos: usize, key: &[u8]) -> bool {
        pos < node.entries.len() && self.cmp(key, &node.entries[pos].key) == Ordering::Equal
    }

    fn descend_pos(&self, node: &Node, pos: usize, key: &[u8]) -> usize {
        if self.exact_at(node, pos, key) {
            pos + 1
        } else {
            pos
        }
    }

    /// Descend from the root to the leaf that would contain `key`, keeping
    /// a path stack of `(offset, find_key_pos result)`. `path`'s indices
    /// are the raw `find_key_pos` position at each level (used to splice a
    /// promoted separator back into an ancestor on a split cascade), not
    /// the (possibly +1) index actually followed to descend.
    fn descend_to_leaf(&mut self, key: &[u8]) -> XbaseResult<(Vec<(u32, usize)>, Node)> {
        let mut path = Vec::new();
        let mut offset = self.root_offset;
        loop {
            let node = self.read(offset)?;
            if node.is_leaf {
                return Ok((path, node));
            }
            let pos = self.find_key_pos(&node, key);
            if self.unique && self.exact_at(&node, pos, key) {
                return Err(XbaseError::new(ErrorKind::DuplicateKey, "duplicate key in unique index"));
            }
            let child = self.child_at(&node, self.descend_pos(&node, pos, key));
            path.push((offset, pos));
            offset = node::require_offset(child)?;
        }
    }

    pub fn insert(&mut self, key: &[u8], recno: u32) -> XbaseResult<()> {
        if key.len() != self.key_length as usize {
            return Err(XbaseError::new(
                ErrorKind::InvalidIndex,
                format!("key length {} does not match index key length {}", key.len(), self.key_length),
            ));
        }

        let (mut path, mut node) = self.descend_to_leaf(key)?;

        if self.unique {
            for e in &node.entries {
                if self.cmp(key, &e.key) == Ordering::Equal {
                    return Err(XbaseError::new(ErrorKind::DuplicateKey, "duplicate key in unique index"));
                }
            }
        }

        let pos = self.find_key_pos(&node, key);
        node.entries.insert(
            pos,
            Entry { key: key.to_vec(), recno, child_offset: 0 },
        );

        // Cascade splits upward until an ancestor has room or the root
        // itself splits.
        while node.entries.len() >= self.order as usize {
            let (shrunk, sibling, promoted_key, promoted_recno) = self.split(node)?;
            self.write(&shrunk)?;
            self.write(&sibling)?;

            match path.pop() {
                None => {
                    // shrunk was the root; allocate a fresh root above it.
                    let new_root_offset =
                        create_node(&mut self.file, false, self.order, self.key_length)?;
                    self.node_count += 1;
                    let mut new_root = Node::new_internal(new_root_offset);
                    new_root.entries.push(Entry {
                        key: promoted_key,
                        recno: promoted_recno,
                        child_offset: shrunk.file_offset,
                    });
                    new_root.right_child = sibling.file_offset;
                    self.write(&new_root)?;
                    self.root_offset = new_root_offset;
                    self.header_dirty = true;
                    break;
                }
                Some((parent_offset, parent_pos)) => {
                    let mut parent = self.read(parent_offset)?;
                    parent.entries.insert(
                        parent_pos,
                        Entry {
                            key: promoted_key,
                            recno: promoted_recno,
                            child_offset: shrunk.file_offset,
                        },
                    );
                    if parent_pos + 1 < parent.entries.len() {
                        parent.entries[parent_pos + 1].child_offset = sibling.file_offset;
                    } else {
                        parent.right_child = sibling.file_offset;
                    }
                    node = parent;
                    // keep cascading from `node` (now the parent)
                    if node.entries.len() < self.order as usize {
                        self.write(&node)?;
                        break;
                    }
                    // else loop again with `node` as the overflowing parent
                }
            }
        }

        if self.header_dirty {
            self.write_header()?;
        } else {
            self.file.flush()?;
        }
        trace!("inserted key (recno {}) into XDX {}", recno, self.path.display());
        Ok(())
    }

    /// Splits a node whose entry count has reached `order`. Returns the
    /// shrunk left node, the new right sibling, and the promoted
    /// (key, recno) pair for the parent.
    ///
    /// Leaf splits copy the median entry into the new sibling and promote a
    /// clone of its key (with the recno zeroed out — it is a routing key,
    /// not data). Internal-node splits still move the median entry up,
    /// since an internal entry only ever holds a routing key to begin with;
    /// the (key, recno) pair it carries already has a leaf-resident copy
    /// elsewhere. This keeps every real (key, recno) pair reachable from a
    /// leaf, which `delete`/`next` rely on.
    fn split(&mut self, mut node: Node) -> XbaseResult<(Node, Node, Vec<u8>, u32)> {
        let is_leaf = node.is_leaf;
        let sibling_offset = create_node(&mut self.file, is_leaf, self.order, self.key_length)?;
        self.node_count += 1;
        self.header_dirty = true;

        let mid = node.entries.len() / 2;

        if is_leaf {
            let sibling_entries = node.entries.split_off(mid);
            let promoted_key = sibling_entries[0].key.clone();
            let mut sibling = Node::new_leaf(sibling_offset);
            sibling.entries = sibling_entries;
            Ok((node, sibling, promoted_key, 0))
        } else {
            let right_entries = node.entries.split_off(mid + 1);
            let promoted = node.entries.pop().expect("mid entry must exist");
            let mut sibling = Node::new_internal(sibling_offset);
            sibling.entries = right_entries;
            sibling.right_child = node.right_child;
            node.right_child = promoted.child_offset;
            Ok((node, sibling, promoted.key, promoted.recno))
        }
    }

    pub fn delete(&mut self, key: &[u8], recno: u32) -> XbaseResult<bool> {
        let mut offset = self.root_offset;
        let mut node;
        loop {
            node = self.read(offset)?;
            if node.is_leaf {
                break;
            }
            let pos = self.find_key_pos(&node, key);
            offset = node::require_offset(self.child_at(&node, self.descend_pos(&node, pos, key)))?;
        }

        let del_pos = node
            .entries
            .iter()
            .position(|e| self.cmp(key, &e.key) == Ordering::Equal && e.recno == recno);

        match del_pos {
            None => Ok(false),
            Some(idx) => {
                node.entries.remove(idx);
                self.write(&node)?;
                self.file.flush()?;
                Ok(true)
            }
        }
    }

    pub fn seek(&mut self, key: &[u8]) -> XbaseResult<bool> {
        self.found = false;
        self.current_recno = 0;

        let mut offset = self.root_offset;
        loop {
            let node = self.read(offset)?;
            let pos = self.find_key_pos(&node, key);

            if node.is_leaf {
                if pos < node.entries.len() {
                    match self.cmp(key, &node.entries[pos].key) {
                        Ordering::Equal => {
                            self.found = true;
                            self.current_recno = node.entries[pos].recno;
                        }
                        Ordering::Less => {
                            self.current_recno = node.entries[pos].recno;
                        }
                        Ordering::Greater => {
                            self.current_recno = 0;
                        }
                    }
                } else {
                    self.current_recno = 0;
                }
                break;
            }

            // Internal entries only hold routing keys: an exact match here
            // means the real leaf entry is in the subtree to the right of
            // this separator (leaf splits copy the median key into the
            // sibling), so keep descending rather than answering from here.
            offset = node::require_offset(self.child_at(&node, self.descend_pos(&node, pos, key)))?;
        }
        Ok(self.found)
    }

    pub fn go_top(&mut self) -> XbaseResult<bool> {
        let mut offset = self.root_offset;
        loop {
            let node = self.read(offset)?;
            if node.is_leaf {
                if let Some(first) = node.entries.first() {
                    self.current_recno = first.recno;
                    self.found = true;
                    return Ok(true);
                }
                self.current_recno = 0;
                self.found = false;
                return Ok(false);
            }
            offset = node::require_offset(self.child_at(&node, 0))?;
        }
    }

    pub fn go_bottom(&mut self) -> XbaseResult<bool> {
        let mut offset = self.root_offset;
        loop {
            let node = self.read(offset)?;
            if node.is_leaf {
                if let Some(last) = node.entries.last() {
                    self.current_recno = last.recno;
                    self.found = true;
                    return Ok(true);
                }
                self.current_recno = 0;
                self.found = false;
                return Ok(false);
            }
            offset = node::require_offset(node.right_child)?;
        }
    }

    pub fn eof(&self) -> bool {
        self.current_recno == 0
    }

    pub fn bof(&self) -> bool {
        self.current_recno == 0
    }

    /// The smallest (key, recno) pair strictly greater than `(key, recno)`
    /// in comparator order, or `None` at the end of the index. Together
    /// with `go_top` this gives an in-order cursor over the whole index
    /// without a leaf sibling-linked list: it walks down to the leaf that
    /// would hold `key`, then either answers from within that leaf or
    /// ascends the path stack to the nearest ancestor it descended left
    /// from and takes the leftmost entry of that ancestor's right subtree.
    pub fn next(&mut self, key: &[u8], recno: u32) -> XbaseResult<Option<(Vec<u8>, u32)>> {
        let (path, leaf) = self.locate_path(key)?;

        if let Some(idx) = leaf
            .entries
            .iter()
            .position(|e| self.cmp(key, &e.key) == Ordering::Equal && e.recno == recno)
        {
            if idx + 1 < leaf.entries.len() {
                let e = &leaf.entries[idx + 1];
                return Ok(Some((e.key.clone(), e.recno)));
            }
        } else if let Some(idx) = leaf.entries.iter().position(|e| self.cmp(key, &e.key) != Ordering::Greater) {
            // `(key, recno)` itself isn't present (already deleted, or
            // never existed) — resync to the first entry at or after it.
            let e = &leaf.entries[idx];
            return Ok(Some((e.key.clone(), e.recno)));
        }

        for (offset, pos) in path.into_iter().rev() {
            let node = self.read(offset)?;
            if pos < node.entries.len() {
                let child = node::require_offset(self.child_at(&node, pos + 1))?;
                return Ok(Some(self.leftmost_entry(child)?));
            }
        }
        Ok(None)
    }

    /// Like `descend_to_leaf`, but never errors on a duplicate key and
    /// keeps the raw `find_key_pos` index at every level (used by `next`
    /// to resume ascending toward the next subtree).
    fn locate_path(&mut self, key: &[u8]) -> XbaseResult<(Vec<(u32, usize)>, Node)> {
        let mut path = Vec::new();
        let mut offset = self.root_offset;
        loop {
            let node = self.read(offset)?;
            if node.is_leaf {
                return Ok((path, node));
            }
            let pos = self.find_key_pos(&node, key);
            let child = self.child_at(&node, self.descend_pos(&node, pos, key));
            path.push((offset, pos));
            offset = node::require_offset(child)?;
        }
    }

    fn leftmost_entry(&mut self, mut offset: u32) -> XbaseResult<(Vec<u8>, u32)> {
        loop {
            let node = self.read(offset)?;
            if node.is_leaf {
                let e = node.entries.first().expect("non-empty subtree");
                return Ok((e.key.clone(), e.recno));
            }
            offset = node::require_offset(self.child_at(&node, 0))?;
        }
    }

    /// Rebuilds the index from scratch against `dbf`, using `key_fn` to
    /// compute each non-deleted record's key. Duplicate keys on a UNIQUE
    /// index are skipped, not aborting the reindex.
    pub fn reindex(
        &mut self,
        dbf: &mut Dbf,
        mut key_fn: impl FnMut(&mut Dbf, u32) -> XbaseResult<Option<Vec<u8>>>,
    ) -> XbaseResult<()> {
        self.file.set_len(header::HEADER_SIZE as u64)?;
        self.node_count = 0;
        let root_offset = create_node(&mut self.file, true, self.order, self.key_length)?;
        self.root_offset = root_offset;
        self.node_count = 1;
        self.header_dirty = true;

        let reccount = dbf.reccount();
        for recno in 1..=reccount {
            dbf.goto(recno)?;
            if dbf.deleted() {
                continue;
            }
            if let Some(key) = key_fn(dbf, recno)? {
                match self.insert(&key, recno) {
                    Ok(()) => {}
                    Err(e) if e.kind == ErrorKind::DuplicateKey => {
                        debug!("reindex: skipping duplicate key at recno {}", recno);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        self.write_header()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad_char(s: &str, len: usize) -> Vec<u8> {
        let mut v = s.as_bytes().to_vec();
        v.resize(len, b' ');
        v
    }

    #[test]
    fn insert_then_seek_finds_exact_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.xdx");
        let mut xdx = Xdx::create(&path, "NAME", KeyType::Char, 10, false, false).unwrap();
        for (name, recno) in [("Charlie", 1u32), ("Alice", 2), ("Bob", 3), ("David", 4), ("Eve", 5)] {
            xdx.insert(&pad_char(name, 10), recno).unwrap();
        }
        assert!(xdx.go_top().unwrap());
        assert_eq!(xdx.recno(), 2); // Alice
        assert!(xdx.go_bottom().unwrap());
        assert_eq!(xdx.recno(), 5); // Eve

        assert!(xdx.seek(&pad_char("Bob", 10)).unwrap());
        assert!(xdx.found());
        assert_eq!(xdx.recno(), 3);

        assert!(!xdx.seek(&pad_char("Frank", 10)).unwrap());
        assert!(!xdx.found());
    }

    #[test]
    fn unique_index_rejects_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.xdx");
        let mut xdx = Xdx::create(&path, "NAME", KeyType::Char, 1, true, false).unwrap();
        xdx.insert(b"X", 1).unwrap();
        let err = xdx.insert(b"X", 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateKey);
        assert!(xdx.go_top().unwrap());
        assert_eq!(xdx.recno(), 1);
    }

    #[test]
    fn many_inserts_force_splits_and_stay_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.xdx");
        let mut xdx = Xdx::create(&path, "N", KeyType::Numeric, 8, false, false).unwrap();
        let mut keys: Vec<u32> = (1..=200).collect();
        // insertion order shuffled deterministically
        keys.rotate_left(73);
        for k in &keys {
            let key_str = format!("{:>8}", k);
            xdx.insert(key_str.as_bytes(), *k).unwrap();
        }
        assert!(xdx.go_top().unwrap());
        assert_eq!(xdx.recno(), 1);
        assert!(xdx.go_bottom().unwrap());
        assert_eq!(xdx.recno(), 200);
    }

    #[test]
    fn order_three_minimum_still_works() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.xdx");
        let mut xdx = Xdx::create(&path, "N", KeyType::Numeric, 8, false, false).unwrap();
        xdx.order = 3;
        for k in 1..=20u32 {
            xdx.insert(format!("{:>8}", k).as_bytes(), k).unwrap();
        }
        assert!(xdx.go_top().unwrap());
        assert_eq!(xdx.recno(), 1);
        assert!(xdx.go_bottom().unwrap());
        assert_eq!(xdx.recno(), 20);
    }

    #[test]
    fn delete_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.xdx");
        let mut xdx = Xdx::create(&path, "N", KeyType::Char, 1, false, false).unwrap();
        xdx.insert(b"X", 1).unwrap();
        assert!(xdx.delete(b"X", 1).unwrap());
        assert!(!xdx.delete(b"X", 1).unwrap());
    }

    #[test]
    fn delete_of_promoted_separator_key_is_actually_gone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.xdx");
        let mut xdx = Xdx::create(&path, "N", KeyType::Numeric, 8, false, false).unwrap();
        xdx.order = 3;
        // Sequential inserts with order 3 force several splits, promoting
        // keys 2, 3, 4, 5 and 6 into internal nodes as routing separators.
        for k in 1..=7u32 {
            xdx.insert(format!("{:>8}", k).as_bytes(), k).unwrap();
        }

        let key3 = format!("{:>8}", 3);
        assert!(xdx.seek(key3.as_bytes()).unwrap());
        assert_eq!(xdx.recno(), 3);

        assert!(xdx.delete(key3.as_bytes(), 3).unwrap());
        assert!(!xdx.delete(key3.as_bytes(), 3).unwrap());
        assert!(!xdx.seek(key3.as_bytes()).unwrap());

        // neighbouring keys, including others promoted into internal
        // nodes, must still be reachable
        for k in [1u32, 2, 4, 5, 6, 7] {
            let key = format!("{:>8}", k);
            assert!(xdx.seek(key.as_bytes()).unwrap());
            assert_eq!(xdx.recno(), k);
        }
    }

    #[test]
    fn in_order_traversal_matches_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idx.xdx");
        let mut xdx = Xdx::create(&path, "N", KeyType::Numeric, 8, false, false).unwrap();
        xdx.order = 3;
        let mut keys: Vec<u32> = (1..=20).collect();
        keys.rotate_left(11);
        for k in &keys {
            xdx.insert(format!("{:>8}", k).as_bytes(), *k).unwrap();
        }

        assert!(xdx.go_top().unwrap());
        let mut seen = vec![xdx.recno()];
        let mut cur_key = format!("{:>8}", xdx.recno());
        let mut cur_recno = xdx.recno();
        while let Some((next_key, next_recno)) = xdx.next(cur_key.as_bytes(), cur_recno).unwrap() {
            seen.push(next_recno);
            cur_key = String::from_utf8(next_key).unwrap();
            cur_recno = next_recno;
        }

        assert_eq!(seen, (1..=20u32).collect::<Vec<_>>());
    }
}
