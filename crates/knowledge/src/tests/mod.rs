//! Shared test doubles and cross-module pipeline tests.


mod pipeline;
