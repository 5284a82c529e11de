//! Node-hosted CoffeeScript compiler runner.

mod runner;

pub use runner::{
    CoffeeError, CoffeeRunner, CoffeeSyntaxError, CompileInput, CompileOptions, CompileOutput,
    FileCompileResult,
};
