use num_traits::Zero;
use super::XYXY;
use crate::common::*;

/// The generic rectangle.
///
/// Coordinates follow the image convention: `x` grows to the right and `y`
/// grows downwards, so `(x1, y1)` is the top-left corner.
pub trait Rect {
    type Type;

    fn x1(&self) -> Self::Type;
    fn y1(&self) -> Self::Type;
    fn x2(&self) -> Self::Type;
    fn y2(&self) -> Self::Type;
    fn cx(&self) -> Self::Type;
    fn cy(&self) -> Self::Type;
    fn w(&self) -> Self::Type;
    fn h(&self) -> Self::Type;

    fn try_from_xyxy(xyxy: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_cxcywh(cxcywh: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd,
{
    fn from_xyxy(xyxy: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_xyxy(xyxy).unwrap()
    }

    fn from_cxcywh(cxcywh: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_cxcywh(cxcywh).unwrap()
    }

    fn xyxy(&self) -> [Self::Type; 4] {
        [self.x1(), self.y1(), self.x2(), self.y2()]
    }

    /// Returns true if the box covers no area.
    fn is_empty(&self) -> bool {
        let zero = Self::Type::zero();
        !(self.w() > zero && self.h() > zero)
    }

    fn area(&self) -> <Self::Type as Mul<Self::Type>>::Output
    where
        Self::Type: Mul<Self::Type>,
    {
        self.w() * self.h()
    }
}

pub trait RectFloat: RectNum
where
    Self::Type: Float,
{
    fn intersect_with<R>(&self, other: &R) -> Option<XYXY<Self::Type>>
    where
        R: Rect<Type = Self::Type>,
    {
        let x1 = self.x1().max(other.x1());
        let y1 = self.y1().max(other.y1());
        let x2 = self.x2().min(other.x2());
        let y2 = self.y2().min(other.y2());
        (x2 > x1 && y2 > y1).then(|| XYXY { x1, y1, x2, y2 })
    }

    fn intersection_area_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        self.intersect_with(other)
            .map(|rect| rect.area())
            .unwrap_or_else(Self::Type::zero)
    }

    fn iou_with<R>(&self, other: &R, epsilon: Self::Type) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        let inter_area = self.intersection_area_with(other);
        let union_area = self.area() + other.w() * other.h() - inter_area + epsilon;
        inter_area / union_area
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd,
{
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Float,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CxCyWH;
    use approx::assert_abs_diff_eq;

    #[test]
    fn iou_of_shifted_boxes() {
        let lhs = XYXY::from_xyxy([0.0, 0.0, 10.0, 10.0]);
        let rhs = XYXY::from_xyxy([2.5, 0.0, 12.5, 10.0]);
        assert_abs_diff_eq!(lhs.iou_with(&rhs, 0.0), 0.6, epsilon = 1e-9);
        assert_abs_diff_eq!(rhs.iou_with(&lhs, 0.0), 0.6, epsilon = 1e-9);
    }

    #[test]
    fn iou_of_disjoint_boxes() {
        let lhs = XYXY::from_xyxy([0.0, 0.0, 1.0, 1.0]);
        let rhs = XYXY::from_xyxy([1.0, 1.0, 2.0, 2.0]);
        assert!(lhs.intersect_with(&rhs).is_none());
        assert_eq!(lhs.iou_with(&rhs, 1e-8), 0.0);
    }

    #[test]
    fn iou_across_forms() {
        let corner = XYXY::from_xyxy([0.0f32, 0.0, 4.0, 4.0]);
        let center = CxCyWH::from_cxcywh([2.0f32, 2.0, 4.0, 4.0]);
        assert_abs_diff_eq!(corner.iou_with(&center, 0.0), 1.0);
    }

    #[test]
    fn empty_boxes() {
        assert!(CxCyWH::from_cxcywh([1.0, 1.0, 0.0, 2.0]).is_empty());
        assert!(!CxCyWH::from_cxcywh([1.0, 1.0, 0.5, 2.0]).is_empty());
    }
}
