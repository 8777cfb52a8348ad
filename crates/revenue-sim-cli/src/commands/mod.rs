pub mod rules;
pub mod scenarios;
pub mod simulation;
