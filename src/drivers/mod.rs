//! Low-level RTOS helpers.

pub mod task_pin;
