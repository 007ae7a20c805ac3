//! Small statistics utilities for the trustube workspace.
//!
//! # Modules
//!
//! - [`tail`]: bounded ascending pools of the largest values seen, used to
//!   read empirical tail quantiles off streamed residuals
//! - [`summary`]: compact count/min/max/mean aggregates for status reports
//!
//! # Examples
//!
//! ## Reading a tail quantile from a stream
//!
//! ```
//! use trustube_stats::tail::TailPool;
//!
//! let mut pool = TailPool::new(2);
//! pool.extend([0.4, 1.7, 0.9]);
//! pool.extend([2.2, 0.1]);
//!
//! // The two largest values survive; the smaller of them is the threshold.
//! assert_eq!(pool.as_slice(), &[1.7, 2.2]);
//! assert_eq!(pool.threshold(), Some(1.7));
//! ```
//!
//! ## Summarizing scores
//!
//! ```
//! use trustube_stats::summary::Summary;
//!
//! let summary = Summary::new([0.8, 0.9, 0.7]).unwrap();
//! assert_eq!(summary.count, 3);
//! assert!((summary.mean - 0.8).abs() < 1e-12);
//! ```

pub mod summary;
pub mod tail;
