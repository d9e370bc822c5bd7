use crate::common::*;

/// A width/height pair, used for anchor sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WH<T> {
    w: T,
    h: T,
}

impl<T> WH<T>
where
    T: Num + PartialOrd + Copy,
{
    pub fn try_from_wh(wh: [T; 2]) -> Result<Self> {
        let [w, h] = wh;
        let zero = T::zero();
        ensure!(
            w > zero && h > zero,
            "width and height parameters must be positive"
        );
        Ok(Self { w, h })
    }

    pub fn from_wh(wh: [T; 2]) -> Self {
        Self::try_from_wh(wh).unwrap()
    }

    /// Divides both sides by `unit`, e.g. to turn pixels into ratios.
    pub fn normalize(&self, unit: T) -> Self {
        Self {
            w: self.w / unit,
            h: self.h / unit,
        }
    }

    pub fn area(&self) -> T {
        self.w * self.h
    }

    pub fn w(&self) -> T {
        self.w
    }

    pub fn h(&self) -> T {
        self.h
    }
}
