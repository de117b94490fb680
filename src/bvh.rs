use crate::math::{Aabb, Ray};
use crate::triangle::{Triangle, TriangleHit};

/// Build-time BVH node. Interior nodes own both children directly; leaves
/// carry a single triangle index. This tree is only ever walked once, to
/// flatten it into a `LinearNode` array — nothing queries it directly.
enum TreeNode {
    Leaf {
        bbox: Aabb,
        triangle_index: usize,
    },
    Interior {
        bbox: Aabb,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn bbox(&self) -> Aabb {
        match self {
            TreeNode::Leaf { bbox, .. } => *bbox,
            TreeNode::Interior { bbox, .. } => *bbox,
        }
    }
}

/// A run-time BVH node in a flat, breadth-first-ordered array. `left` and
/// `right` are indices into the same array; `0` means absent (the root is
/// never a child, so index `0` can double as the sentinel). `triangle_index`
/// is `-1` for interior nodes and the triangle's index for leaves.
#[derive(Debug, Clone, Copy)]
struct LinearNode {
    bbox: Aabb,
    left: i32,
    right: i32,
    triangle_index: i32,
}

/// A bounding volume hierarchy over a fixed slice of triangles, built once
/// via a recursive median split on the longest axis of each node's triangle
/// centroids and then flattened breadth-first for cache-friendly traversal.
pub struct Bvh {
    nodes: Vec<LinearNode>,
}

impl Bvh {
    /// Builds a BVH over all of `triangles`. Panics only if `triangles` is
    /// empty — callers must guard for an empty scene before constructing one.
    pub fn build(triangles: &[Triangle]) -> Self {
        assert!(!triangles.is_empty(), "cannot build a BVH over zero triangles");
        let mut indices: Vec<usize> = (0..triangles.len()).collect();
        let root = build_recursive(triangles, &mut indices);

        let mut nodes = Vec::new();
        flatten_breadth_first(&root, &mut nodes);
        Bvh { nodes }
    }

    /// Walks the hierarchy with a bounded stack, testing every candidate
    /// triangle and keeping the closest hit in front of the ray.
    pub fn closest_hit(&self, ray: &Ray, triangles: &[Triangle]) -> Option<(usize, TriangleHit)> {
        const STACK_CAP: usize = 32;
        let mut stack = [0i32; STACK_CAP];
        let mut sp = 0usize;
        stack[sp] = 0;
        sp += 1;

        let mut best: Option<(usize, TriangleHit)> = None;
        while sp > 0 {
            sp -= 1;
            let node = &self.nodes[stack[sp] as usize];
            if !node.bbox.hit(ray) {
                continue;
            }
            if node.triangle_index >= 0 {
                let tri_idx = node.triangle_index as usize;
                if let Some(hit) = triangles[tri_idx].hit(ray) {
                    if best.map_or(true, |(_, b)| hit.t < b.t) {
                        best = Some((tri_idx, hit));
                    }
                }
                continue;
            }
            if node.left > 0 {
                stack[sp] = node.left;
                sp += 1;
            }
            if node.right > 0 {
                stack[sp] = node.right;
                sp += 1;
            }
        }
        best
    }
}

fn build_recursive(triangles: &[Triangle], indices: &mut [usize]) -> TreeNode {
    if indices.len() == 1 {
        let idx = indices[0];
        return TreeNode::Leaf {
            bbox: Aabb::new(triangles[idx].min_vertex(), triangles[idx].max_vertex()),
            triangle_index: idx,
        };
    }

    let centroid_bounds = indices.iter().fold(None, |acc: Option<Aabb>, &i| {
        let c = triangles[i].centroid();
        let point_box = Aabb::new(c, c);
        Some(match acc {
            Some(b) => Aabb::surrounding(&b, &point_box),
            None => point_box,
        })
    }).unwrap();
    let axis = centroid_bounds.longest_axis();

    indices.sort_unstable_by(|&a, &b| {
        let ca = triangles[a].centroid()[axis];
        let cb = triangles[b].centroid()[axis];
        ca.partial_cmp(&cb).unwrap()
    });

    let mid = indices.len().div_ceil(2);
    let (left_indices, right_indices) = indices.split_at_mut(mid);
    let left = build_recursive(triangles, left_indices);
    let right = build_recursive(triangles, right_indices);
    let bbox = Aabb::surrounding(&left.bbox(), &right.bbox());
    TreeNode::Interior {
        bbox,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Flattens the owned tree into `nodes` in breadth-first order, so that
/// every child index is strictly greater than its parent's.
fn flatten_breadth_first(root: &TreeNode, nodes: &mut Vec<LinearNode>) {
    let mut queue: std::collections::VecDeque<&TreeNode> = std::collections::VecDeque::new();
    nodes.push(LinearNode {
        bbox: root.bbox(),
        left: 0,
        right: 0,
        triangle_index: -1,
    });
    queue.push_back(root);
    let mut cursor = 0usize;

    while let Some(node) = queue.pop_front() {
        match node {
            TreeNode::Leaf { triangle_index, .. } => {
                nodes[cursor].triangle_index = *triangle_index as i32;
            }
            TreeNode::Interior { left, right, .. } => {
                let left_idx = nodes.len();
                nodes.push(LinearNode {
                    bbox: left.bbox(),
                    left: 0,
                    right: 0,
                    triangle_index: -1,
                });
                let right_idx = nodes.len();
                nodes.push(LinearNode {
                    bbox: right.bbox(),
                    left: 0,
                    right: 0,
                    triangle_index: -1,
                });
                nodes[cursor].left = left_idx as i32;
                nodes[cursor].right = right_idx as i32;
                queue.push_back(left);
                queue.push_back(right);
            }
        }
        cursor += 1;
    }
}
