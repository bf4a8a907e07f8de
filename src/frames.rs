use log::debug;

use crate::addressing::{cyclic_distance, physical_address};
use crate::constants::*;
use crate::memory::PhysicalMemory;

/// Write zero to every word of `frame`.
pub fn clear_table<M: PhysicalMemory>(mem: &mut M, frame: u64) {
    for offset in 0..PAGE_SIZE as u64 {
        mem.write_word(physical_address(frame, offset), 0);
    }
}

/// A frame together with the physical address of the parent slot naming it.
#[derive(Debug, Clone, Copy, Default)]
struct SlotRef {
    frame: u64,
    parent_slot: usize,
}

/// Everything a single pass over the page-table tree learns.
///
/// Frame number 0 doubles as the "no candidate yet" sentinel in `empty` and
/// `victim`, the same convention that marks a table slot vacant; the root can
/// therefore never be picked.
#[derive(Debug, Default)]
struct TreeScan {
    /// First interior frame observed with every entry zero.
    empty: SlotRef,
    /// Largest frame number stored in any visited slot.
    max_used_frame: u64,
    /// Resident leaf maximizing the cyclic distance to the incoming page.
    victim: SlotRef,
    victim_page: u64,
    victim_distance: u64,
}

impl TreeScan {
    /// Run one depth-first pass rooted at frame 0.
    fn run<M: PhysicalMemory>(mem: &M, page: u64, source_frame: u64) -> TreeScan {
        let mut scan = TreeScan::default();
        scan.visit(mem, page, source_frame, 0, 0, ROOT_FRAME, 0);
        scan
    }

    fn visit<M: PhysicalMemory>(
        &mut self,
        mem: &M,
        page: u64,
        source_frame: u64,
        depth: usize,
        parent_slot: usize,
        frame: u64,
        page_prefix: u64,
    ) {
        if depth == TABLES_DEPTH {
            // Leaf: eviction candidate. Strict > keeps the first leaf in
            // traversal order when two sit at equal distance.
            let distance = cyclic_distance(page_prefix, page);
            if distance > self.victim_distance && frame != source_frame {
                self.victim = SlotRef { frame, parent_slot };
                self.victim_page = page_prefix;
                self.victim_distance = distance;
            }
            return;
        }

        let mut is_empty = true;
        for offset in 0..PAGE_SIZE as u64 {
            let slot = physical_address(frame, offset);
            let child = mem.read_word(slot) as u64;
            if child != 0 {
                is_empty = false;
                if child > self.max_used_frame {
                    self.max_used_frame = child;
                }
                self.visit(
                    mem,
                    page,
                    source_frame,
                    depth + 1,
                    slot,
                    child,
                    (page_prefix << OFFSET_WIDTH) | offset,
                );
            }
        }

        // First empty table wins; the source frame never qualifies.
        if is_empty && frame != source_frame && self.empty.frame == 0 {
            self.empty = SlotRef { frame, parent_slot };
        }
    }
}

/// Find or manufacture a frame to hang under the walk's current slot.
///
/// `page` is the virtual page being swapped in, `source_frame` is the frame
/// whose slot the caller is about to fill (recycling it would dangle the
/// in-progress walk), and `depth` is the walk level the allocation happens
/// at. The result is never the root and never `source_frame`. A frame bound
/// for an interior table (`depth < TABLES_DEPTH - 1`) comes back zeroed; a
/// leaf target keeps its contents for the caller to restore over.
pub fn allocate_frame<M: PhysicalMemory>(
    mem: &mut M,
    page: u64,
    source_frame: u64,
    depth: usize,
) -> u64 {
    let scan = TreeScan::run(mem, page, source_frame);

    let frame = if scan.empty.frame != 0 {
        // An interior table with no live children: unlink it and take it.
        mem.write_word(scan.empty.parent_slot, 0);
        debug!("reusing empty table frame {}", scan.empty.frame);
        scan.empty.frame
    } else if scan.max_used_frame + 1 < NUM_FRAMES as u64 {
        debug!("extending into unused frame {}", scan.max_used_frame + 1);
        scan.max_used_frame + 1
    } else {
        // Saturated: unlink the farthest leaf before pushing it out.
        mem.write_word(scan.victim.parent_slot, 0);
        mem.evict_page(scan.victim.frame, scan.victim_page);
        debug!(
            "evicted page {} (distance {}) from frame {}",
            scan.victim_page, scan.victim_distance, scan.victim.frame
        );
        scan.victim.frame
    };

    if depth < TABLES_DEPTH - 1 {
        clear_table(mem, frame);
    }
    frame
}
