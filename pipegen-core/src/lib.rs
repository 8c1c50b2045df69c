//! Pipegen core library.
//!
//! Generates synthetic instances of a multi-echelon pipe-network design
//! problem (plants → tanks → transfer nodes → final demand nodes) and
//! serializes them to the external solver's flat parameter-file format.
//!
//! Generation is a single synchronous pass: node indexing, topology,
//! demand/supply balancing, cost assignment, then one immutable
//! [`Instance`]. Determinism is opt-in: pin both RNG streams (see
//! [`RngStreams`]) and two runs produce byte-identical artifacts.

pub mod cost;
mod demand;
pub mod dzn;
mod error;
mod generator;
mod index;
mod instance;
pub mod report;
mod stress;
mod topology;
mod util;

pub use crate::{
    demand::{balance, sample_demands, Balance, Envelope, SizeCategory, DEFAULT_TARGET_SLACK},
    error::{GeneratorError, GeneratorErrorCode, Result},
    generator::{Generator, GeneratorBuilder, RngStreams},
    index::{LayerSizes, NodeClass, NodeId},
    instance::{Instance, InstanceMetadata, SizeClass},
    report::SolverOutcome,
    stress::StressVariant,
    topology::{LayerPair, PipeArc, Topology},
};
