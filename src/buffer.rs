use crate::error::{InputError, SliceError};

/// Amortized growth strategy for slice buffers.
///
/// When a buffer is full its capacity becomes
/// `capacity + floor(capacity * (factor - 1)) + increment`, i.e.
/// `capacity * 1.5 + 1` with the defaults. `capacity_limit` caps the size any
/// single buffer may reach; crossing it is reported as an allocation failure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthPolicy {
    factor: f64,
    increment: usize,
    capacity_limit: Option<usize>,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            factor: 1.5,
            increment: 1,
            capacity_limit: None,
        }
    }
}

impl GrowthPolicy {
    /// Creates a growth policy.
    ///
    /// # Errors
    ///
    /// Returns an error if `factor < 1` or `increment == 0`.
    pub fn new(factor: f64, increment: usize) -> Result<Self, InputError> {
        if factor.is_nan() || factor < 1.0 {
            return Err(InputError::NonPositiveParameter {
                parameter: "growth factor - 1",
                value: factor - 1.0,
            });
        }
        if increment == 0 {
            return Err(InputError::NonPositiveParameter {
                parameter: "growth increment",
                value: 0.0,
            });
        }
        Ok(Self {
            factor,
            increment,
            capacity_limit: None,
        })
    }

    /// Returns a copy of this policy that refuses to grow past `limit` entries.
    #[must_use]
    pub fn with_capacity_limit(mut self, limit: usize) -> Self {
        self.capacity_limit = Some(limit);
        self
    }

    /// Returns the capacity ceiling, if any.
    #[must_use]
    pub fn capacity_limit(&self) -> Option<usize> {
        self.capacity_limit
    }

    /// Capacity to reserve when a buffer of capacity `current` is full.
    #[must_use]
    pub fn next_capacity(&self, current: usize) -> usize {
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let extra = (current as f64 * (self.factor - 1.0)).floor() as usize;
        current
            .saturating_add(extra)
            .saturating_add(self.increment)
    }

    /// Capacity a buffer holding `len` entries must reach to accept one more.
    ///
    /// Parallel buffers are all reserved to this same target so they fail or
    /// succeed together.
    ///
    /// # Errors
    ///
    /// Returns `SliceError::AllocationFailure` if the target capacity exceeds
    /// the limit or the allocator refuses the request.
    pub(crate) fn ensure_room(&self, len: usize, capacity: usize) -> Result<usize, SliceError> {
        if len < capacity {
            return Ok(capacity);
        }
        let requested = self.next_capacity(capacity);
        if self.capacity_limit.is_some_and(|limit| requested > limit) {
            return Err(SliceError::AllocationFailure { requested });
        }
        Ok(requested)
    }
}

/// Pushes `value`, growing `buf` under `policy` when it is full.
///
/// # Errors
///
/// Returns `SliceError::AllocationFailure` if the buffer cannot grow.
pub fn push_with_growth<T>(
    buf: &mut Vec<T>,
    value: T,
    policy: &GrowthPolicy,
) -> Result<(), SliceError> {
    reserve_to(buf, policy.ensure_room(buf.len(), buf.capacity())?)?;
    buf.push(value);
    Ok(())
}

/// Reserves room for `target` entries in total.
///
/// # Errors
///
/// Returns `SliceError::AllocationFailure` if the allocator refuses the request.
pub(crate) fn reserve_to<T>(buf: &mut Vec<T>, target: usize) -> Result<(), SliceError> {
    if target <= buf.capacity() {
        return Ok(());
    }
    buf.try_reserve_exact(target - buf.len())
        .map_err(|_| SliceError::AllocationFailure { requested: target })
}
