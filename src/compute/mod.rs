//! Geocell computation: the codec, distance math and the two search algorithms.

pub mod bbox;
pub mod distance;
pub mod geocell;
pub mod proximity;
pub mod validation;
