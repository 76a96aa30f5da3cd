//! Flat record list to rooted forest.
//!
//! # Role
//!
//! Rebuilds the engine hierarchy from `parentId` references. Records whose
//! parent does not resolve become roots. Sibling and root order is the order
//! of the source list.
//!
//! # Invariants
//!
//! - Every record lands in exactly one node.
//! - A record never becomes its own ancestor: self references and longer loops
//!   are rejected with [`TreeError`] instead of being built.

use rustc_hash::FxHashMap;

use crate::record::EngineRecord;

/// Structural defect in a record collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
	/// A record names itself as its parent.
	#[error("record '{id}' is its own parent")]
	SelfParent { id: String },
	/// Parent references loop through two or more records.
	#[error("parent cycle: {}", ids.join(" -> "))]
	Cycle { ids: Vec<String> },
}

/// One record and its ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode<'a> {
	record: &'a EngineRecord,
	children: Vec<TreeNode<'a>>,
}

impl<'a> TreeNode<'a> {
	pub fn record(&self) -> &'a EngineRecord {
		self.record
	}

	pub fn children(&self) -> &[TreeNode<'a>] {
		&self.children
	}
}

/// Forest under the synthetic root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Forest<'a> {
	roots: Vec<TreeNode<'a>>,
	len: usize,
}

/// One step of a depth-first walk.
#[derive(Debug, Clone, Copy)]
pub struct WalkItem<'f, 'a> {
	pub node: &'f TreeNode<'a>,
	/// Zero for roots.
	pub depth: usize,
	/// `None` when the node hangs off the synthetic root.
	pub parent: Option<&'f TreeNode<'a>>,
}

impl<'a> Forest<'a> {
	pub fn roots(&self) -> &[TreeNode<'a>] {
		&self.roots
	}

	/// Number of records in the forest.
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Pre-order walk: every parent is yielded before its children.
	pub fn walk(&self) -> Walk<'_, 'a> {
		let stack = self.roots.iter().rev().map(|node| (node, 0, None)).collect();
		Walk { stack }
	}
}

/// Iterator returned by [`Forest::walk`].
pub struct Walk<'f, 'a> {
	stack: Vec<(&'f TreeNode<'a>, usize, Option<&'f TreeNode<'a>>)>,
}

impl<'f, 'a> Iterator for Walk<'f, 'a> {
	type Item = WalkItem<'f, 'a>;

	fn next(&mut self) -> Option<Self::Item> {
		let (node, depth, parent) = self.stack.pop()?;
		self.stack
			.extend(node.children.iter().rev().map(|child| (child, depth + 1, Some(node))));
		Some(WalkItem { node, depth, parent })
	}
}

/// Builds the forest for `records`.
///
/// Duplicate ids are not repaired: the last record with a given id is the one
/// children attach to.
pub fn build(records: &[EngineRecord]) -> Result<Forest<'_>, TreeError> {
	let mut index: FxHashMap<&str, usize> = FxHashMap::default();
	for (pos, record) in records.iter().enumerate() {
		// Checked by id, not by index: with duplicate ids the parent may
		// resolve to another record carrying the same id.
		if record.parent_id.as_deref() == Some(record.id.as_str()) {
			return Err(TreeError::SelfParent { id: record.id.clone() });
		}
		index.insert(record.id.as_str(), pos);
	}

	let parent_of: Vec<Option<usize>> = records
		.iter()
		.map(|record| record.parent_id.as_deref().and_then(|p| index.get(p).copied()))
		.collect();

	check_acyclic(records, &parent_of)?;

	let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
	let mut roots = Vec::new();
	for (pos, parent) in parent_of.iter().enumerate() {
		match parent {
			Some(parent) => children[*parent].push(pos),
			None => roots.push(pos),
		}
	}

	// Children are assembled bottom-up with an explicit stack so deep chains
	// cannot exhaust the call stack.
	let mut built: Vec<Option<TreeNode<'_>>> = (0..records.len()).map(|_| None).collect();
	let mut stack: Vec<(usize, bool)> = Vec::new();
	for &root in &roots {
		stack.push((root, false));
		while let Some((pos, expanded)) = stack.pop() {
			if expanded {
				let kids = children[pos].iter().filter_map(|&child| built[child].take()).collect();
				built[pos] = Some(TreeNode {
					record: &records[pos],
					children: kids,
				});
			} else {
				stack.push((pos, true));
				stack.extend(children[pos].iter().rev().map(|&child| (child, false)));
			}
		}
	}

	let roots = roots.iter().filter_map(|&root| built[root].take()).collect();
	Ok(Forest {
		roots,
		len: records.len(),
	})
}

/// Rejects parent chains that loop.
///
/// Each record has at most one parent, so a three-colour walk along the
/// chains finds every loop in linear time.
fn check_acyclic(records: &[EngineRecord], parent_of: &[Option<usize>]) -> Result<(), TreeError> {
	#[derive(Clone, Copy, PartialEq, Eq)]
	enum Mark {
		Unvisited,
		OnPath,
		Done,
	}

	let mut marks = vec![Mark::Unvisited; records.len()];
	let mut path: Vec<usize> = Vec::new();

	for start in 0..records.len() {
		if marks[start] != Mark::Unvisited {
			continue;
		}
		path.clear();
		let mut cursor = Some(start);
		while let Some(pos) = cursor {
			match marks[pos] {
				Mark::Done => break,
				Mark::OnPath => {
					let from = path.iter().position(|&p| p == pos).unwrap_or(0);
					let cycle = &path[from..];
					if let [only] = cycle {
						return Err(TreeError::SelfParent {
							id: records[*only].id.clone(),
						});
					}
					return Err(TreeError::Cycle {
						ids: cycle.iter().map(|&p| records[p].id.clone()).collect(),
					});
				}
				Mark::Unvisited => {
					marks[pos] = Mark::OnPath;
					path.push(pos);
					cursor = parent_of[pos];
				}
			}
		}
		for &pos in &path {
			marks[pos] = Mark::Done;
		}
	}
	Ok(())
}
