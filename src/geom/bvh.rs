//! Bounding volume hierarchy over planar boxes.

use super::Point2;

/// Axis-aligned box in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bounds2 {
    pub(crate) min: Point2,
    pub(crate) max: Point2,
}

impl Bounds2 {
    pub(crate) fn of_triangle([a, b, c]: [Point2; 3]) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x).min(c.x), a.y.min(b.y).min(c.y)),
            max: Point2::new(a.x.max(b.x).max(c.x), a.y.max(b.y).max(c.y)),
        }
    }

    /// The box of half-width `slack` centred on `p`.
    pub(crate) fn around(p: Point2, slack: f64) -> Self {
        Self {
            min: Point2::new(p.x - slack, p.y - slack),
            max: Point2::new(p.x + slack, p.y + slack),
        }
    }

    pub(crate) fn span(self) -> f64 {
        (self.max.x - self.min.x).max(self.max.y - self.min.y)
    }

    pub(crate) fn contains(self, p: Point2, slack: f64) -> bool {
        p.x >= self.min.x - slack
            && p.x <= self.max.x + slack
            && p.y >= self.min.y - slack
            && p.y <= self.max.y + slack
    }

    fn intersects(self, other: Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    fn union(self, other: Self) -> Self {
        Self {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    fn center(self) -> Point2 {
        Point2::new(
            0.5 * (self.min.x + self.max.x),
            0.5 * (self.min.y + self.max.y),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bounds: Bounds2,
    left: u32,
    right: u32,
    start: u32,
    count: u32,
}

impl BvhNode {
    const fn leaf(bounds: Bounds2, start: u32, count: u32) -> Self {
        Self {
            bounds,
            left: u32::MAX,
            right: u32::MAX,
            start,
            count,
        }
    }

    const fn inner(bounds: Bounds2, left: u32, right: u32) -> Self {
        Self {
            bounds,
            left,
            right,
            start: 0,
            count: 0,
        }
    }

    const fn is_leaf(self) -> bool {
        self.count != 0
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Bvh {
    nodes: Vec<BvhNode>,
    prim_indices: Vec<u32>,
}

impl Bvh {
    const DEFAULT_LEAF_SIZE: usize = 8;

    #[must_use]
    pub(crate) fn build(bounds: &[Bounds2]) -> Option<Self> {
        Self::build_with_leaf_size(bounds, Self::DEFAULT_LEAF_SIZE)
    }

    #[must_use]
    pub(crate) fn build_with_leaf_size(bounds: &[Bounds2], leaf_size: usize) -> Option<Self> {
        if bounds.is_empty() {
            return None;
        }

        let leaf_size = leaf_size.clamp(1, 256);
        let prim_indices: Vec<u32> = (0..(bounds.len() as u32)).collect();
        let nodes = Vec::with_capacity(bounds.len().saturating_mul(2));

        let mut bvh = Self {
            nodes,
            prim_indices,
        };
        bvh.build_node(bounds, 0, bounds.len(), leaf_size);
        Some(bvh)
    }

    /// Box around every primitive.
    pub(crate) fn root_bounds(&self) -> Option<Bounds2> {
        self.nodes.first().map(|node| node.bounds)
    }

    fn build_node(&mut self, bounds: &[Bounds2], start: usize, end: usize, leaf_size: usize) -> u32 {
        let node_index = self.nodes.len() as u32;
        let seed = bounds[self.prim_indices[start] as usize];
        self.nodes.push(BvhNode::leaf(seed, 0, 0));

        let range = self.range_bounds(bounds, start, end);
        let count = end - start;

        if count <= leaf_size {
            self.nodes[node_index as usize] = BvhNode::leaf(range, start as u32, count as u32);
            return node_index;
        }

        let axis = self.choose_split_axis(bounds, start, end);
        let mid = start + count / 2;
        self.prim_indices[start..end].select_nth_unstable_by(mid - start, |a, b| {
            let ca = centroid_component(bounds[*a as usize], axis);
            let cb = centroid_component(bounds[*b as usize], axis);
            ca.total_cmp(&cb)
        });

        let left = self.build_node(bounds, start, mid, leaf_size);
        let right = self.build_node(bounds, mid, end, leaf_size);
        self.nodes[node_index as usize] = BvhNode::inner(range, left, right);
        node_index
    }

    fn range_bounds(&self, bounds: &[Bounds2], start: usize, end: usize) -> Bounds2 {
        let mut range = bounds[self.prim_indices[start] as usize];
        for &idx in &self.prim_indices[(start + 1)..end] {
            range = range.union(bounds[idx as usize]);
        }
        range
    }

    fn choose_split_axis(&self, bounds: &[Bounds2], start: usize, end: usize) -> u8 {
        let first = bounds[self.prim_indices[start] as usize].center();
        let mut min = first;
        let mut max = first;

        for &idx in &self.prim_indices[(start + 1)..end] {
            let c = bounds[idx as usize].center();
            min.x = min.x.min(c.x);
            min.y = min.y.min(c.y);
            max.x = max.x.max(c.x);
            max.y = max.y.max(c.y);
        }

        if max.x - min.x >= max.y - min.y { 0 } else { 1 }
    }

    /// Calls `visit` with every primitive whose box meets `query` until it
    /// returns `false`. Order is unspecified.
    pub(crate) fn query<F>(&self, query: Bounds2, mut visit: F)
    where
        F: FnMut(usize) -> bool,
    {
        if self.nodes.is_empty() {
            return;
        }

        let mut stack = Vec::new();
        stack.push(0u32);

        while let Some(node_idx) = stack.pop() {
            let node = self.nodes[node_idx as usize];
            if !node.bounds.intersects(query) {
                continue;
            }

            if node.is_leaf() {
                let start = node.start as usize;
                let end = start + node.count as usize;
                for &prim in &self.prim_indices[start..end] {
                    if !visit(prim as usize) {
                        return;
                    }
                }
                continue;
            }

            stack.push(node.left);
            stack.push(node.right);
        }
    }
}

fn centroid_component(bounds: Bounds2, axis: u8) -> f64 {
    let c = bounds.center();
    if axis == 0 { c.x } else { c.y }
}
