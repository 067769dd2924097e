use super::*;

#[test]
fn rect_edges_are_exclusive() {
    let r = Rect::new(10, 20, 30, 40);
    assert_eq!(r.right(), 40);
    assert_eq!(r.bottom(), 60);
    assert!(r.fits_in(Size::new(40, 60)));
    assert!(!r.fits_in(Size::new(39, 60)));
    assert!(!r.fits_in(Size::new(40, 59)));
}

#[test]
fn empty_when_either_extent_is_zero() {
    assert!(Size::new(0, 5).is_empty());
    assert!(Size::new(5, 0).is_empty());
    assert!(!Size::new(1, 1).is_empty());
    assert!(Rect::new(3, 3, 0, 9).is_empty());
}

#[test]
fn area_does_not_overflow() {
    assert_eq!(Size::new(u32::MAX, 2).area(), u64::from(u32::MAX) * 2);
    assert_eq!(Size::new(1920, 1080).swapped(), Size::new(1080, 1920));
}

#[test]
fn rotations_are_flip_combinations() {
    assert_eq!(Transform::ROT_180, Transform::FLIP_H | Transform::FLIP_V);
    assert!(Transform::ROT_270.contains(Transform::ROT_90));
    assert!(Transform::ROT_270.contains(Transform::ROT_180));
}

#[test]
fn fence_wire_representation() {
    assert_eq!(Fence::from_raw(-1), None);
    assert_eq!(Fence::from_raw(0), Some(Fence(0)));
    assert_eq!(Fence::to_raw(None), Fence::NONE_RAW);
    assert_eq!(Fence::to_raw(Some(Fence(7))), 7);
}

#[test]
fn dataspace_fields_decode() {
    let ds = Dataspace::from_parts(ColorStandard::Bt2020 as u32, true);
    assert_eq!(ds.standard(), Some(ColorStandard::Bt2020));
    assert!(ds.is_full_range());

    let limited = Dataspace::from_parts(ColorStandard::Bt601_625 as u32, false);
    assert_eq!(limited.standard(), Some(ColorStandard::Bt601_625));
    assert!(!limited.is_full_range());

    assert_eq!(Dataspace::from_parts(40, false).standard(), None);
    assert_eq!(Dataspace::UNKNOWN.standard(), Some(ColorStandard::Unspecified));
}

#[test]
fn only_premultiplied_is_premultiplied() {
    assert!(CompositingMode::Premultiplied.is_premultiplied());
    assert!(!CompositingMode::Coverage.is_premultiplied());
    assert!(!CompositingMode::None.is_premultiplied());
}

#[test]
fn align_up_rounds_to_power_of_two() {
    assert_eq!(align_up(30, 16), 32);
    assert_eq!(align_up(32, 16), 32);
    assert_eq!(align_up(0, 32), 0);
    assert_eq!(align_up(9600, 32), 9600);
}
