//! Node classes and the canonical 1-based node index.
//!
//! The solver addresses nodes by a single global integer, assigned by
//! concatenating the class blocks in fixed order: Plant, Tank, Transfer,
//! Final. Index assignment is a pure function of the layer sizes; no node is
//! ever renumbered after creation.

use std::fmt;

use serde::Serialize;

use crate::error::{GeneratorError, Result};

/// Global 1-based node index as written to the parameter file.
pub type NodeId = usize;

/// The four node classes of the network, in fixed forward order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize)]
pub enum NodeClass {
    /// Supply source.
    Plant,
    /// Intermediate storage.
    Tank,
    /// Transfer (transshipment) node with demand.
    Transfer,
    /// Final demand node.
    Final,
}

impl NodeClass {
    /// All classes in layer order.
    pub const ALL: [Self; 4] = [Self::Plant, Self::Tank, Self::Transfer, Self::Final];
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plant => "plant",
            Self::Tank => "tank",
            Self::Transfer => "transfer",
            Self::Final => "final",
        };
        f.write_str(name)
    }
}

/// Validated per-layer node counts.
///
/// # Examples
/// ```
/// use pipegen_core::{LayerSizes, NodeClass};
///
/// let sizes = LayerSizes::new(1, 2, 2, 3).expect("all layers are non-empty");
/// assert_eq!(sizes.total(), 8);
/// assert_eq!(sizes.global_index(NodeClass::Transfer, 0), 4);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct LayerSizes {
    plants: usize,
    tanks: usize,
    transfers: usize,
    finals: usize,
}

impl LayerSizes {
    /// Validates and constructs the layer sizes.
    ///
    /// # Errors
    /// Returns [`GeneratorError::InvalidSize`] if any layer is empty: a
    /// zero-size layer would produce a degenerate layer pair with no valid
    /// arcs.
    pub fn new(plants: usize, tanks: usize, transfers: usize, finals: usize) -> Result<Self> {
        for (class, got) in [
            (NodeClass::Plant, plants),
            (NodeClass::Tank, tanks),
            (NodeClass::Transfer, transfers),
            (NodeClass::Final, finals),
        ] {
            if got == 0 {
                return Err(GeneratorError::InvalidSize { class, got });
            }
        }
        Ok(Self {
            plants,
            tanks,
            transfers,
            finals,
        })
    }

    /// Number of nodes in the given class.
    #[must_use]
    pub const fn len_of(&self, class: NodeClass) -> usize {
        match class {
            NodeClass::Plant => self.plants,
            NodeClass::Tank => self.tanks,
            NodeClass::Transfer => self.transfers,
            NodeClass::Final => self.finals,
        }
    }

    /// Number of plant nodes.
    #[must_use]
    pub const fn plants(&self) -> usize {
        self.plants
    }

    /// Number of tank nodes.
    #[must_use]
    pub const fn tanks(&self) -> usize {
        self.tanks
    }

    /// Number of transfer nodes.
    #[must_use]
    pub const fn transfers(&self) -> usize {
        self.transfers
    }

    /// Number of final nodes.
    #[must_use]
    pub const fn finals(&self) -> usize {
        self.finals
    }

    /// Total node count across all classes.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.plants + self.tanks + self.transfers + self.finals
    }

    /// First global index of the given class block (1-based).
    #[must_use]
    pub const fn block_start(&self, class: NodeClass) -> NodeId {
        match class {
            NodeClass::Plant => 1,
            NodeClass::Tank => 1 + self.plants,
            NodeClass::Transfer => 1 + self.plants + self.tanks,
            NodeClass::Final => 1 + self.plants + self.tanks + self.transfers,
        }
    }

    /// Maps `(class, offset)` to the global 1-based index.
    ///
    /// # Panics
    /// Panics if `offset` is outside the class block; offsets always come
    /// from iteration over `0..len_of(class)`.
    #[must_use]
    pub fn global_index(&self, class: NodeClass, offset: usize) -> NodeId {
        assert!(
            offset < self.len_of(class),
            "offset {offset} out of range for {class} layer of {}",
            self.len_of(class)
        );
        self.block_start(class) + offset
    }

    /// Maps a global index back to `(class, offset)`. Returns `None` for
    /// indices outside `1..=total()`.
    #[must_use]
    pub fn locate(&self, id: NodeId) -> Option<(NodeClass, usize)> {
        if id == 0 || id > self.total() {
            return None;
        }
        for class in NodeClass::ALL {
            let start = self.block_start(class);
            if id < start + self.len_of(class) {
                return Some((class, id - start));
            }
        }
        None
    }

    /// Iterates the global indices of the given class block.
    pub fn ids_of(&self, class: NodeClass) -> impl Iterator<Item = NodeId> {
        let start = self.block_start(class);
        start..start + self.len_of(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 2, 2, 3, NodeClass::Plant)]
    #[case(1, 0, 2, 3, NodeClass::Tank)]
    #[case(1, 2, 0, 3, NodeClass::Transfer)]
    #[case(1, 2, 2, 0, NodeClass::Final)]
    fn rejects_empty_layer(
        #[case] plants: usize,
        #[case] tanks: usize,
        #[case] transfers: usize,
        #[case] finals: usize,
        #[case] class: NodeClass,
    ) {
        let err = LayerSizes::new(plants, tanks, transfers, finals)
            .expect_err("empty layers must be rejected");
        assert!(matches!(
            err,
            GeneratorError::InvalidSize { class: c, got: 0 } if c == class
        ));
    }

    #[rstest]
    fn assigns_contiguous_blocks() {
        let sizes = LayerSizes::new(1, 2, 2, 3).expect("sizes are valid");
        assert_eq!(sizes.global_index(NodeClass::Plant, 0), 1);
        assert_eq!(sizes.global_index(NodeClass::Tank, 0), 2);
        assert_eq!(sizes.global_index(NodeClass::Tank, 1), 3);
        assert_eq!(sizes.global_index(NodeClass::Transfer, 0), 4);
        assert_eq!(sizes.global_index(NodeClass::Final, 2), 8);
    }

    #[rstest]
    fn locate_rejects_out_of_range() {
        let sizes = LayerSizes::new(1, 2, 2, 3).expect("sizes are valid");
        assert_eq!(sizes.locate(0), None);
        assert_eq!(sizes.locate(9), None);
        assert_eq!(sizes.locate(8), Some((NodeClass::Final, 2)));
    }

    proptest! {
        #[test]
        fn index_round_trips(
            plants in 1usize..8,
            tanks in 1usize..32,
            transfers in 1usize..32,
            finals in 1usize..64,
        ) {
            let sizes = LayerSizes::new(plants, tanks, transfers, finals)
                .expect("sizes are valid");
            for class in NodeClass::ALL {
                for offset in 0..sizes.len_of(class) {
                    let id = sizes.global_index(class, offset);
                    prop_assert_eq!(sizes.locate(id), Some((class, offset)));
                }
            }
            for id in 1..=sizes.total() {
                let (class, offset) = sizes.locate(id).expect("id is in range");
                prop_assert_eq!(sizes.global_index(class, offset), id);
            }
        }
    }
}
