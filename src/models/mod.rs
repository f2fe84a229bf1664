// src/models/mod.rs

pub mod admin;
pub mod exam;
pub mod exam_result;
pub mod student;
