//! Bitmap based PID allocation
//!
//! One bit per PID up to the configured maximum. Allocation scans forward
//! from a hint and wraps around, so freed PIDs are recycled once the hint
//! has moved past them or when it drops back on free.

use super::types::Pid;

/// Maximum supported PID value (2^18 - 1 = 262143)
pub const MAX_PID: u64 = (1 << 18) - 1;

/// Minimum PID value (PID 0 is never handed out)
pub const MIN_PID: Pid = 1;

pub struct PidAllocator {
    /// Bit set = allocated. Bit 0 (PID 0) is permanently set.
    bitmap: Vec<u64>,
    /// Highest PID this allocator may hand out
    max_pid: Pid,
    /// Where the next search starts
    next_hint: Pid,
    /// Number of allocated PIDs, excluding the reserved PID 0
    allocated_count: usize,
}

impl PidAllocator {
    pub fn new(max_pid: Pid) -> Self {
        let max_pid = max_pid.clamp(MIN_PID, MAX_PID as Pid);
        let words = (max_pid as usize / 64) + 1;
        let mut bitmap = vec![0u64; words];
        bitmap[0] = 1; // PID 0 reserved
        Self {
            bitmap,
            max_pid,
            next_hint: MIN_PID,
            allocated_count: 0,
        }
    }

    pub fn max_pid(&self) -> Pid {
        self.max_pid
    }

    #[inline]
    pub fn is_allocated(&self, pid: Pid) -> bool {
        if pid > self.max_pid {
            return false;
        }
        let word_idx = (pid / 64) as usize;
        let bit_idx = pid % 64;
        (self.bitmap[word_idx] & (1 << bit_idx)) != 0
    }

    /// Claim a specific PID. Fails if it is out of range or taken.
    pub fn mark_allocated(&mut self, pid: Pid) -> bool {
        if pid < MIN_PID || pid > self.max_pid {
            return false;
        }
        let word_idx = (pid / 64) as usize;
        let bit_idx = pid % 64;
        if (self.bitmap[word_idx] & (1 << bit_idx)) != 0 {
            return false;
        }
        self.bitmap[word_idx] |= 1 << bit_idx;
        self.allocated_count += 1;
        true
    }

    /// Release a PID. Returns false if it was not allocated.
    pub fn mark_free(&mut self, pid: Pid) -> bool {
        if pid < MIN_PID || pid > self.max_pid {
            return false;
        }
        let word_idx = (pid / 64) as usize;
        let bit_idx = pid % 64;
        if (self.bitmap[word_idx] & (1 << bit_idx)) == 0 {
            return false;
        }
        self.bitmap[word_idx] &= !(1 << bit_idx);
        self.allocated_count -= 1;
        if pid < self.next_hint {
            self.next_hint = pid;
        }
        true
    }

    /// Find and claim the next free PID.
    pub fn allocate_next(&mut self) -> Option<Pid> {
        let start_word = (self.next_hint / 64) as usize;
        let words = self.bitmap.len();

        // Search from the hint to the end, then wrap around to the hint.
        for word_idx in (start_word..words).chain(0..start_word) {
            let word = self.bitmap[word_idx];
            if word == u64::MAX {
                continue;
            }

            let first_zero = (!word).trailing_zeros() as Pid;
            let pid = (word_idx as Pid) * 64 + first_zero;
            if pid > self.max_pid {
                continue;
            }

            if self.mark_allocated(pid) {
                self.next_hint = if pid == self.max_pid { MIN_PID } else { pid + 1 };
                return Some(pid);
            }
        }

        None
    }

    /// Number of allocated PIDs
    #[inline]
    pub fn count(&self) -> usize {
        self.allocated_count
    }
}
