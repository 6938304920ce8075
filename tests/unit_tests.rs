//! Unit test harness for the `tests/unit` modules.

mod unit;
