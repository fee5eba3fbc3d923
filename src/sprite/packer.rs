//! Binary-tree rectangle packing.
//!
//! Pure functions, no I/O. Blocks are placed largest-first into a tree of
//! free rectangles that grows right or down when nothing fits, keeping the
//! sheet roughly square. Every block is padded on its right and bottom edge
//! so neighbours never touch; the sheet itself is trimmed to the last pixel
//! actually used.

/// An image to place: its name and pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl Block {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

/// A placed block: top-left offset within the sheet plus its size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placed {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Sheet dimensions and placements, in the order blocks were given.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub items: Vec<Placed>,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    used: bool,
    right: Option<usize>,
    down: Option<usize>,
}

impl Node {
    fn free(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            used: false,
            right: None,
            down: None,
        }
    }
}

/// Arena-backed packing tree; `root` changes as the sheet grows.
struct Tree {
    nodes: Vec<Node>,
    root: usize,
}

impl Tree {
    fn new(w: u32, h: u32) -> Self {
        Self {
            nodes: vec![Node::free(0, 0, w, h)],
            root: 0,
        }
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn find(&self, idx: usize, w: u32, h: u32) -> Option<usize> {
        let node = &self.nodes[idx];
        if node.used {
            node.right
                .and_then(|r| self.find(r, w, h))
                .or_else(|| node.down.and_then(|d| self.find(d, w, h)))
        } else if w <= node.w && h <= node.h {
            Some(idx)
        } else {
            None
        }
    }

    /// Occupy the top-left `w`×`h` of a free node; the remainder becomes a
    /// right strip and a down strip.
    fn split(&mut self, idx: usize, w: u32, h: u32) -> (u32, u32) {
        let Node { x, y, w: nw, h: nh, .. } = self.nodes[idx];
        let down = self.push(Node::free(x, y + h, nw, nh - h));
        let right = self.push(Node::free(x + w, y, nw - w, h));
        let node = &mut self.nodes[idx];
        node.used = true;
        node.down = Some(down);
        node.right = Some(right);
        (x, y)
    }

    fn grow(&mut self, w: u32, h: u32) -> (u32, u32) {
        let root = self.nodes[self.root];
        let can_grow_down = w <= root.w;
        let can_grow_right = h <= root.h;
        // Prefer the direction that keeps the sheet closest to square.
        let should_grow_right = can_grow_right && root.h >= root.w + w;
        let should_grow_down = can_grow_down && root.w >= root.h + h;

        if should_grow_right {
            self.grow_right(w, h)
        } else if should_grow_down {
            self.grow_down(w, h)
        } else if can_grow_right {
            self.grow_right(w, h)
        } else {
            // Blocks arrive longest-side first, so the root always spans the
            // longest side in one direction; one of the two branches fits.
            self.grow_down(w, h)
        }
    }

    fn grow_right(&mut self, w: u32, h: u32) -> (u32, u32) {
        let old = self.nodes[self.root];
        let strip = self.push(Node::free(old.w, 0, w, old.h.max(h)));
        let new_root = self.push(Node {
            x: 0,
            y: 0,
            w: old.w + w,
            h: old.h.max(h),
            used: true,
            right: Some(strip),
            down: Some(self.root),
        });
        self.root = new_root;
        self.split(strip, w, h)
    }

    fn grow_down(&mut self, w: u32, h: u32) -> (u32, u32) {
        let old = self.nodes[self.root];
        let strip = self.push(Node::free(0, old.h, old.w.max(w), h));
        let new_root = self.push(Node {
            x: 0,
            y: 0,
            w: old.w.max(w),
            h: old.h + h,
            used: true,
            right: Some(self.root),
            down: Some(strip),
        });
        self.root = new_root;
        self.split(strip, w, h)
    }
}

/// Placement order: longest side first, then shorter side, height, width,
/// and name so equal-sized blocks land deterministically.
fn placement_order(blocks: &[Block]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..blocks.len()).collect();
    order.sort_by(|&a, &b| {
        let (ba, bb) = (&blocks[a], &blocks[b]);
        let key = |blk: &Block| {
            (
                blk.width.max(blk.height),
                blk.width.min(blk.height),
                blk.height,
                blk.width,
            )
        };
        key(bb).cmp(&key(ba)).then_with(|| ba.name.cmp(&bb.name))
    });
    order
}

/// Pack `blocks` with `padding` transparent pixels between neighbours.
///
/// The result lists placements in the same order as `blocks`. An empty
/// input yields a 0×0 layout.
pub fn pack(blocks: &[Block], padding: u32) -> Layout {
    let order = placement_order(blocks);
    let Some(&first) = order.first() else {
        return Layout::default();
    };

    let padded = |b: &Block| (b.width + padding, b.height + padding);
    let (w0, h0) = padded(&blocks[first]);
    let mut tree = Tree::new(w0, h0);
    let mut offsets = vec![(0u32, 0u32); blocks.len()];

    for idx in order {
        let (w, h) = padded(&blocks[idx]);
        offsets[idx] = match tree.find(tree.root, w, h) {
            Some(node) => tree.split(node, w, h),
            None => tree.grow(w, h),
        };
    }

    let items: Vec<Placed> = blocks
        .iter()
        .zip(offsets)
        .map(|(b, (x, y))| Placed {
            name: b.name.clone(),
            x,
            y,
            width: b.width,
            height: b.height,
        })
        .collect();

    let width = items.iter().map(|p| p.x + p.width).max().unwrap_or(0);
    let height = items.iter().map(|p| p.y + p.height).max().unwrap_or(0);
    Layout {
        width,
        height,
        items,
    }
}
