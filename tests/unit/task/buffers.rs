use super::*;

#[test]
fn nothing_allocated_before_reserve() {
    let mut buffers = TaskBuffers::new();
    assert_eq!(buffers.capacity(), 0);
    assert!(buffers.target_regs().is_err());
    assert!(buffers.source_mut(0).is_err());
    assert!(!buffers.stats().target_allocated);
}

#[test]
fn grows_but_never_shrinks() {
    let mut buffers = TaskBuffers::new();
    buffers.reserve(2).unwrap();
    assert_eq!(buffers.capacity(), 2);
    assert_eq!(buffers.target_regs().unwrap().len(), DST_FIELD_COUNT);
    assert_eq!(buffers.source_regs(1).unwrap().len(), SRC_FIELD_COUNT);

    buffers.reserve(1).unwrap();
    assert_eq!(buffers.capacity(), 2);
    assert_eq!(buffers.stats().reallocations, 1);

    buffers.reserve(5).unwrap();
    let stats = buffers.stats();
    assert_eq!(stats.capacity, 5);
    assert_eq!(stats.reallocations, 2);
    assert!(stats.target_allocated);
    assert_eq!(buffers.all_source_regs().count(), 5);
    assert_eq!(buffers.images(3).len(), 3);
    assert_eq!(buffers.images(9).len(), 5);
}

#[test]
fn new_slots_are_zeroed() {
    let mut buffers = TaskBuffers::new();
    buffers.reserve(1).unwrap();
    buffers.source_mut(0).unwrap().1[3] = 99;
    buffers.reserve(3).unwrap();
    assert!(buffers.all_source_regs().all(|r| r.iter().all(|&v| v == 0)));
}

#[test]
fn over_limit_keeps_previous_state() {
    let mut buffers = TaskBuffers::new();
    buffers.reserve(4).unwrap();
    let err = buffers.reserve(MAX_IMAGES + 1).unwrap_err();
    assert!(matches!(err, G2dError::Config(_)));
    assert_eq!(buffers.capacity(), 4);
    assert!(buffers.source_mut(3).is_ok());
}

#[test]
fn source_regs_mut_is_bounded() {
    let mut buffers = TaskBuffers::new();
    buffers.reserve(4).unwrap();
    for regs in buffers.source_regs_mut(2) {
        regs[0] = 1;
    }
    let firsts: Vec<u32> = buffers.all_source_regs().map(|r| r[0]).collect();
    assert_eq!(firsts, vec![1, 1, 0, 0]);
}
