use crate::models::NodeId;

/// Computes dense sibling positions (`0..n`)
///
/// Siblings are always renumbered contiguously after a structural change so
/// that `sort_order` doubles as the 0-based index among siblings. Only
/// positions that actually changed are written back.
pub struct SortOrderCalculator;

impl SortOrderCalculator {
    /// Position for a node appended after `sibling_count` existing siblings
    pub fn append_position(sibling_count: usize) -> i32 {
        i32::try_from(sibling_count).unwrap_or(i32::MAX)
    }

    /// Clamp a requested position into `0..=last`
    pub fn clamp_position(position: usize, sibling_count: usize) -> usize {
        position.min(sibling_count.saturating_sub(1))
    }

    /// Move `id` to `position` (clamped), keeping the relative order of
    /// every other sibling
    ///
    /// # Example
    /// Input:  [1, 2, 3, 4], move 4 to position 1
    /// Output: [1, 4, 2, 3]
    pub fn move_to_position(ordered: &[NodeId], id: NodeId, position: usize) -> Vec<NodeId> {
        let mut result: Vec<NodeId> = ordered.iter().copied().filter(|&n| n != id).collect();
        if result.len() == ordered.len() {
            return result;
        }
        let position = position.min(result.len());
        result.insert(position, id);
        result
    }

    /// Positions that differ from the current ones after dense renumbering
    ///
    /// `current` is the sibling list in its target order together with each
    /// node's stored sort order.
    pub fn changed_positions(current: &[(NodeId, Option<i32>)]) -> Vec<(NodeId, i32)> {
        current
            .iter()
            .enumerate()
            .filter_map(|(index, &(id, existing))| {
                let position = Self::append_position(index);
                (existing != Some(position)).then_some((id, position))
            })
            .collect()
    }
}
