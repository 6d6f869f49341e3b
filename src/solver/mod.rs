//! Cutting-plane solver implementations
//!
//! This module implements the OCAS bundle method ("Optimized Cutting Plane
//! Algorithm for Support Vector Machines", Franc and Sonnenburg) specialized
//! to the Weighted-Degree feature space, along with its reduced-problem
//! solver, line search and cut buffer.

pub mod cuts;
pub mod line_search;
pub mod ocas;
pub mod qp;

pub use self::cuts::*;
pub use self::line_search::*;
pub use self::ocas::*;
pub use self::qp::*;
