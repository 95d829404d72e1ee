use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;

use super::value_objects::OrderNumber;

// ============================================================================
// Order Number Generation
// ============================================================================
//
// Order numbers are printed on customer tickets, so the default generator
// draws them from the operating system's CSPRNG to keep the sequence
// unpredictable. Uniqueness is not guaranteed here; repositories reject
// numbers still in use and the manager draws again.
//
// ============================================================================

pub trait OrderNumberGenerator: Send + Sync {
    fn next_number(&self) -> OrderNumber;
}

fn draw<R: Rng + ?Sized>(rng: &mut R) -> OrderNumber {
    OrderNumber::clamped(rng.gen_range(OrderNumber::MIN..=OrderNumber::MAX))
}

/// Uniform draw from the OS random source.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRngOrderNumbers;

impl OrderNumberGenerator for OsRngOrderNumbers {
    fn next_number(&self) -> OrderNumber {
        draw(&mut OsRng)
    }
}

/// Reproducible sequence from a fixed seed.
#[derive(Debug)]
pub struct SeededOrderNumbers {
    rng: Mutex<StdRng>,
}

impl SeededOrderNumbers {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl OrderNumberGenerator for SeededOrderNumbers {
    fn next_number(&self) -> OrderNumber {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        draw(&mut *rng)
    }
}

/// Hands out a scripted list of numbers, repeating the last one when exhausted.
#[derive(Debug)]
pub struct FixedOrderNumbers {
    queue: Mutex<VecDeque<OrderNumber>>,
    last: OrderNumber,
}

impl FixedOrderNumbers {
    /// Returns `None` if the list is empty.
    pub fn new(numbers: impl IntoIterator<Item = OrderNumber>) -> Option<Self> {
        let queue: VecDeque<OrderNumber> = numbers.into_iter().collect();
        let last = *queue.back()?;
        Some(Self {
            queue: Mutex::new(queue),
            last,
        })
    }
}

impl OrderNumberGenerator for FixedOrderNumbers {
    fn next_number(&self) -> OrderNumber {
        let mut queue = self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        queue.pop_front().unwrap_or(self.last)
    }
}
