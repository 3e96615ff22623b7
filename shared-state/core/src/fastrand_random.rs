// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{Key, Random, Value};

pub struct FastrandRandom;

impl Random for FastrandRandom {
    fn key(&self, key_space: Key) -> Key {
        fastrand::u32(0..key_space.max(1))
    }

    fn value(&self, max_value: Value) -> Value {
        fastrand::i64(0..max_value.max(1))
    }
}
