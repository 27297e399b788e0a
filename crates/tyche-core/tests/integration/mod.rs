mod common;
mod pipeline_tests;
mod scenario_tests;
