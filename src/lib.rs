#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use cask_archive as archive;
pub use cask_serial as serial;
pub use cask_utils as utils;
