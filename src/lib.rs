#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use prism_ptr as ptr;
pub use prism_reflect as reflect;
pub use prism_utils as utils;
