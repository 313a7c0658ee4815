//! XDX node encoding: fixed-size header plus a variable (but
//! runtime-constant, per-index) key length, so key entries are packed by
//! hand rather than through `define_layout!` (whose field widths must be
//! known at compile time). The header itself still uses `define_layout!`.

use crate::error::{ErrorKind, XbaseError, XbaseResult};
use binary_layout::prelude::*;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

define_layout!(xdx_node_header, LittleEndian, {
    key_count: u16,
    is_leaf: u8,
    _reserved: u8,
    parent_offset: u32,
});

pub const NODE_HEADER_SIZE: usize = 8;

#[derive(Debug, Clone)]
pub struct Entry {
    pub key: Vec<u8>,
    pub recno: u32,
    /// Left child of this entry; unused for leaves.
    pub child_offset: u32,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub file_offset: u32,
    pub is_leaf: bool,
    pub parent_offset: u32,
    pub entries: Vec<Entry>,
    /// Right-most child; unused for leaves.
    pub right_child: u32,
}

impl Node {
    pub fn new_leaf(file_offset: u32) -> Node {
        Node {
            file_offset,
            is_leaf: true,
            parent_offset: 0,
            entries: Vec::new(),
            right_child: 0,
        }
    }

    pub fn new_internal(file_offset: u32) -> Node {
        Node {
            file_offset,
            is_leaf: false,
            parent_offset: 0,
            entries: Vec::new(),
            right_child: 0,
        }
    }

    pub fn key_count(&self) -> usize {
        self.entries.len()
    }
}

/// Fixed per-node file size for an index with this `order`/`key_length`.
pub fn node_size(order: u16, key_length: u16, is_leaf: bool) -> usize {
    let order = order as usize;
    let key_length = key_length as usize;
    if is_leaf {
        NODE_HEADER_SIZE + order * (key_length + 4)
    } else {
        NODE_HEADER_SIZE + order * (key_length + 4 + 4) + 4
    }
}

pub fn read_node(file: &mut File, offset: u32, key_length: u16) -> XbaseResult<Node> {
    file.seek(SeekFrom::Start(offset as u64))?;
    let mut hdr_buf = [0u8; NODE_HEADER_SIZE];
    file.read_exact(&mut hdr_buf)?;
    let view = xdx_node_header::View::new(&hdr_buf);
    let key_count = view.key_count().read() as usize;
    let is_leaf = view.is_leaf().read() != 0;
    let parent_offset = view.parent_offset().read();

    let key_length = key_length as usize;
    let mut entries = Vec::with_capacity(key_count);
    for _ in 0..key_count {
        let mut key = vec![0u8; key_length];
        file.read_exact(&mut key)?;
        let mut u32buf = [0u8; 4];
        file.read_exact(&mut u32buf)?;
        let recno = u32::from_le_bytes(u32buf);
        let child_offset = if !is_leaf {
            file.read_exact(&mut u32buf)?;
            u32::from_le_bytes(u32buf)
        } else {
            0
        };
        entries.push(Entry { key, recno, child_offset });
    }
    let right_child = if !is_leaf {
        let mut u32buf = [0u8; 4];
        file.read_exact(&mut u32buf)?;
        u32::from_le_bytes(u32buf)
    } else {
        0
    };

    Ok(Node {
        file_offset: offset,
        is_leaf,
        parent_offset,
        entries,
        right_child,
    })
}

pub fn write_node(file: &mut File, node: &Node) -> XbaseResult<()> {
    file.seek(SeekFrom::Start(node.file_offset as u64))?;
    let mut hdr_buf = [0u8; NODE_HEADER_SIZE];
    {
        let mut view = xdx_node_header::View::new(&mut hdr_buf);
        view.key_count_mut().write(node.entries.len() as u16);
        view.is_leaf_mut().write(if node.is_leaf { 1 } else { 0 });
        view.parent_offset_mut().write(node.parent_offset);
    }
    file.write_all(&hdr_buf)?;

    for entry in &node.entries {
        file.write_all(&entry.key)?;
        file.write_all(&entry.recno.to_le_bytes())?;
        if !node.is_leaf {
            file.write_all(&entry.child_offset.to_le_bytes())?;
        }
    }
    if !node.is_leaf {
        file.write_all(&node.right_child.to_le_bytes())?;
    }
    Ok(())
}

/// Appends a new, empty node of `node_size` bytes to the end of the file
/// and returns its offset.
pub fn create_node(
    file: &mut File,
    is_leaf: bool,
    order: u16,
    key_length: u16,
) -> XbaseResult<u32> {
    let offset = file.seek(SeekFrom::End(0))? as u32;
    let node = if is_leaf {
        Node::new_leaf(offset)
    } else {
        Node::new_internal(offset)
    };
    write_node(file, &node)?;
    let size = node_size(order, key_length, is_leaf);
    let written = NODE_HEADER_SIZE + if is_leaf { 0 } else { 4 };
    if written < size {
        let padding = vec![0u8; size - written];
        file.write_all(&padding)?;
    }
    Ok(offset)
}

pub fn require_offset(offset: u32) -> XbaseResult<u32> {
    if offset == 0 {
        Err(XbaseError::new(ErrorKind::InvalidIndex, "unexpected null node offset"))
    } else {
        Ok(offset)
    }
}
