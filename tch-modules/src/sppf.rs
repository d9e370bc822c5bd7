use crate::{common::*, conv_block::*};

#[derive(Debug, Clone)]
pub struct SppfInit {
    pub in_c: usize,
    pub out_c: usize,
    /// Kernel size of the max pooling, padded by `k / 2`.
    pub k: usize,
    pub activation: Activation,
}

impl SppfInit {
    pub fn new(in_c: usize, out_c: usize) -> Self {
        Self {
            in_c,
            out_c,
            k: 5,
            activation: Activation::Silu,
        }
    }

    pub fn build<'p, P>(self, path: P) -> Result<Sppf>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let Self {
            in_c,
            out_c,
            k,
            activation,
        } = self;

        ensure!(k % 2 == 1, "pooling kernel size must be odd, but get {}", k);
        let mid_c = in_c / 2;
        ensure!(
            mid_c > 0,
            "SPPF input channels must be at least 2, but get {}",
            in_c
        );

        let conv1 = ConvBlockInit {
            activation,
            ..ConvBlockInit::new(in_c, mid_c, 1)
        }
        .build(path / "conv1")?;
        let conv2 = ConvBlockInit {
            activation,
            ..ConvBlockInit::new(mid_c * 4, out_c, 1)
        }
        .build(path / "conv2")?;

        Ok(Sppf {
            conv1,
            conv2,
            k: k as i64,
        })
    }
}

/// Spatial pyramid pooling with three chained max pools.
#[derive(Debug)]
pub struct Sppf {
    conv1: ConvBlock,
    conv2: ConvBlock,
    k: i64,
}

impl Sppf {
    pub fn in_c(&self) -> usize {
        self.conv1.in_c()
    }

    pub fn out_c(&self) -> usize {
        self.conv2.out_c()
    }

    fn pool(&self, xs: &Tensor) -> Tensor {
        let k = self.k;
        xs.max_pool2d(&[k, k], &[1, 1], &[k / 2, k / 2], &[1, 1], false)
    }
}

impl nn::Module for Sppf {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let xs = xs.apply(&self.conv1);
        let y1 = self.pool(&xs);
        let y2 = self.pool(&y1);
        let y3 = self.pool(&y2);
        Tensor::cat(&[&xs, &y1, &y2, &y3], 1).apply(&self.conv2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::kind::FLOAT_CPU;

    #[test]
    fn sppf_keeps_spatial_size() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let block = SppfInit::new(32, 24).build(&vs.root())?;
        let ys = Tensor::randn(&[2, 32, 3, 5], FLOAT_CPU).apply(&block);
        assert_eq!(ys.size(), vec![2, 24, 3, 5]);
        Ok(())
    }

    #[test]
    fn reject_even_kernel() {
        let vs = nn::VarStore::new(Device::Cpu);
        let result = SppfInit {
            k: 4,
            ..SppfInit::new(32, 32)
        }
        .build(&vs.root());
        assert!(result.is_err());
    }
}
