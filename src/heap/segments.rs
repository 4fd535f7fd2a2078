// Tue Jan 13 2026 - Alex

use crate::heap::{HeapError, HeapSegment};
use crate::memory::{MemoryView, NativeSize, NativeWord};

/// Ordered, non-overlapping set of heap segments.
#[derive(Debug, Clone)]
pub struct SegmentedHeap {
    native: NativeSize,
    segments: Vec<HeapSegment>,
}

impl SegmentedHeap {
    pub fn new(native: NativeSize, segments: Vec<HeapSegment>) -> Result<Self, HeapError> {
        for segment in &segments {
            let end = segment.start().value() as u128 + segment.size() as u128;
            if end > native.mask() as u128 + 1 {
                return Err(HeapError::SegmentOverflow(segment.start().value()));
            }
        }
        for pair in segments.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if current.start() <= previous.start() {
                return Err(HeapError::UnorderedSegments {
                    previous: previous.start().value(),
                    start: current.start().value(),
                });
            }
            let previous_end = previous.start().value().saturating_add(previous.size());
            if current.start().value() < previous_end {
                return Err(HeapError::OverlappingSegments {
                    previous_start: previous.start().value(),
                    previous_end,
                    start: current.start().value(),
                });
            }
        }
        log::debug!("Indexed {} heap segments", segments.len());
        Ok(Self { native, segments })
    }

    pub fn native(&self) -> NativeSize {
        self.native
    }

    pub fn segments(&self) -> &[HeapSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Binary search for the segment containing `address`.
    pub fn get_segment_for_address(&self, address: NativeWord) -> Option<&HeapSegment> {
        let mut low = 0usize;
        let mut high = self.segments.len();
        while low < high {
            let mid = low + (high - low) / 2;
            let segment = &self.segments[mid];
            if address < segment.start() {
                high = mid;
            } else if segment.contains(address) {
                return Some(segment);
            } else {
                low = mid + 1;
            }
        }
        None
    }

    /// View from `address` to the end of its segment.
    pub fn get_memory_view_for_address(&self, address: NativeWord) -> Option<MemoryView> {
        let segment = self.get_segment_for_address(address)?;
        let offset = address.offset_from(segment.start())?;
        segment.view().get_tail(offset).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ByteBuffer;
    use std::sync::Arc;

    fn segment(start: u64, size: usize) -> HeapSegment {
        let view = MemoryView::whole(Arc::new(ByteBuffer::from_vec(vec![0; size])));
        HeapSegment::new(NativeSize::Eight.word(start), view, false)
    }

    fn heap() -> SegmentedHeap {
        SegmentedHeap::new(
            NativeSize::Eight,
            vec![segment(0x1000, 0x100), segment(0x2000, 0x10), segment(0x2010, 0x20), segment(0x9000, 1)],
        )
        .unwrap()
    }

    #[test]
    fn test_every_address_resolves_to_its_segment() {
        let heap = heap();
        for segment in heap.segments() {
            let start = segment.start().value();
            for address in start..start + segment.size() {
                let found = heap.get_segment_for_address(NativeSize::Eight.word(address)).unwrap();
                assert_eq!(found.start(), segment.start());
            }
        }
    }

    #[test]
    fn test_addresses_outside_segments() {
        let heap = heap();
        for address in [0u64, 0xfff, 0x1100, 0x1fff, 0x2030, 0x8fff, 0x9001, u64::MAX] {
            assert!(heap.get_segment_for_address(NativeSize::Eight.word(address)).is_none());
        }
        assert!(heap.get_memory_view_for_address(NativeSize::Eight.word(0x1100)).is_none());
    }

    #[test]
    fn test_view_for_address_runs_to_segment_end() {
        let heap = heap();
        let view = heap.get_memory_view_for_address(NativeSize::Eight.word(0x10f0)).unwrap();
        assert_eq!(view.size(), 0x10);
        assert_eq!(view.offset(), 0xf0);
    }

    #[test]
    fn test_rejects_overlapping_segments() {
        let result = SegmentedHeap::new(NativeSize::Eight, vec![segment(0x1000, 0x100), segment(0x10ff, 0x10)]);
        assert!(matches!(result, Err(HeapError::OverlappingSegments { start: 0x10ff, .. })));
    }

    #[test]
    fn test_rejects_unordered_segments() {
        let result = SegmentedHeap::new(NativeSize::Eight, vec![segment(0x2000, 0x10), segment(0x1000, 0x10)]);
        assert!(matches!(result, Err(HeapError::UnorderedSegments { .. })));
    }

    #[test]
    fn test_rejects_segment_past_narrow_address_space() {
        let view = MemoryView::whole(Arc::new(ByteBuffer::from_vec(vec![0; 0x20])));
        let segment = HeapSegment::new(NativeSize::Four.word(0xffff_fff0), view, false);
        assert!(matches!(
            SegmentedHeap::new(NativeSize::Four, vec![segment]),
            Err(HeapError::SegmentOverflow(_))
        ));
    }
}
