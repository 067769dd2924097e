use super::*;
use crate::task::{
    descriptor::TaskHeader,
    regs::{ExtraReg, ImageFlags},
};

#[test]
fn lists_every_register() {
    let target = [0u32; 2];
    let src = [0x10u32, 0x20];
    let images = [ImageDescriptor {
        flags: ImageFlags::ACQUIRE_FENCE,
        fence: 4,
        ..ImageDescriptor::default()
    }];
    let extra = [ExtraReg::new(0x2000, 0x254)];
    let task = TaskDescriptor {
        header: TaskHeader {
            num_source: 1,
            ..TaskHeader::default()
        },
        sources: &images,
        target_regs: &target,
        source_regs: std::iter::once(&src[..]).collect(),
        extra: &extra,
    };

    let lines = format_task(&task);
    assert!(lines[0].starts_with("source count 1"));
    assert!(lines.iter().any(|l| l.starts_with("Source0: flags 0x2, fence 4")));
    assert!(lines.iter().any(|l| l == "DST[01]: 0x00000000"));
    assert!(lines.iter().any(|l| l == "SRC[00][01]: 0x00000020"));
    assert!(
        lines
            .iter()
            .any(|l| l == "EXTRA: offset 0x00002000, value 0x00000254")
    );
    assert_eq!(lines.len(), 1 + 1 + 1 + 2 + 2 + 1);
}
