#![cfg_attr(
    target_os = "cuda",
    no_std,
    feature(register_attr),
    register_attr(nvvm_internal)
)]

pub mod config;
pub mod global;
pub mod local;
pub mod reduction;
pub mod types;

mod atomic;
mod bitonic;
mod scan;
mod stack;
