use proptest::prelude::*;
use ring_buffer::RingBuffer;

proptest! {
    #[test]
    fn len_never_exceeds_capacity(capacity in 1usize..200, pushes in 0usize..500) {
        let mut buffer = RingBuffer::new(capacity);
        for i in 0..pushes {
            buffer.push(i);
            prop_assert!(buffer.len() <= capacity);
        }
        prop_assert_eq!(buffer.len(), pushes.min(capacity));
    }

    #[test]
    fn keeps_most_recent_items(capacity in 1usize..50, pushes in 1usize..200) {
        let mut buffer = RingBuffer::new(capacity);
        for i in 0..pushes {
            buffer.push(i);
        }
        let expected: Vec<usize> = (pushes.saturating_sub(capacity)..pushes).collect();
        prop_assert_eq!(buffer.to_vec(), expected);
        prop_assert_eq!(buffer.latest().copied(), Some(pushes - 1));
    }
}
