use crate::common::*;

#[derive(Debug, Clone)]
pub struct ConvBlockInit {
    pub in_c: usize,
    pub out_c: usize,
    pub k: usize,
    pub s: usize,
    pub p: usize,
    pub g: usize,
    pub activation: Activation,
}

impl ConvBlockInit {
    /// Stride 1 convolution padded to keep the spatial size.
    pub fn new(in_c: usize, out_c: usize, k: usize) -> Self {
        Self {
            in_c,
            out_c,
            k,
            s: 1,
            p: k / 2,
            g: 1,
            activation: Activation::Silu,
        }
    }

    pub fn build<'p, P>(self, path: P) -> Result<ConvBlock>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let Self {
            in_c,
            out_c,
            k,
            s,
            p,
            g,
            activation,
        } = self;

        ensure!(
            in_c > 0 && out_c > 0,
            "channel counts must be positive, but get in_c={} out_c={}",
            in_c,
            out_c
        );
        ensure!(k > 0 && s > 0, "kernel size and stride must be positive");
        ensure!(
            g > 0 && in_c % g == 0 && out_c % g == 0,
            "in_c ({}) and out_c ({}) must be divisible by groups ({})",
            in_c,
            out_c,
            g
        );

        let conv = nn::conv2d(
            path / "conv",
            in_c as i64,
            out_c as i64,
            k as i64,
            nn::ConvConfig {
                stride: s as i64,
                padding: p as i64,
                groups: g as i64,
                bias: false,
                ..Default::default()
            },
        );
        let bn = nn::batch_norm2d(path / "bn", out_c as i64, Default::default());

        Ok(ConvBlock {
            conv,
            bn,
            activation,
            in_c,
            out_c,
            stride: s,
        })
    }
}

/// Convolution followed by batch normalization and an activation.
#[derive(Debug, CopyGetters)]
pub struct ConvBlock {
    conv: nn::Conv2D,
    bn: nn::BatchNorm,
    activation: Activation,
    #[getset(get_copy = "pub")]
    in_c: usize,
    #[getset(get_copy = "pub")]
    out_c: usize,
    #[getset(get_copy = "pub")]
    stride: usize,
}

impl nn::Module for ConvBlock {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let Self {
            ref conv,
            ref bn,
            activation,
            ..
        } = *self;

        // batch statistics are frozen
        xs.apply(conv).apply_t(bn, false).activation(activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::kind::FLOAT_CPU;

    #[test]
    fn strided_conv_block_halves_size() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let block = ConvBlockInit {
            s: 2,
            ..ConvBlockInit::new(3, 16, 3)
        }
        .build(&root)?;
        assert_eq!(block.stride(), 2);

        let ys = Tensor::randn(&[2, 3, 64, 48], FLOAT_CPU).apply(&block);
        assert_eq!(ys.size(), vec![2, 16, 32, 24]);
        Ok(())
    }

    #[test]
    fn pointwise_conv_block_keeps_size() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let block = ConvBlockInit::new(8, 4, 1).build(&vs.root())?;
        let ys = Tensor::randn(&[1, 8, 5, 7], FLOAT_CPU).apply(&block);
        assert_eq!(ys.size(), vec![1, 4, 5, 7]);
        Ok(())
    }

    #[test]
    fn reject_indivisible_groups() {
        let vs = nn::VarStore::new(Device::Cpu);
        let result = ConvBlockInit {
            g: 4,
            ..ConvBlockInit::new(6, 8, 3)
        }
        .build(&vs.root());
        assert!(result.is_err());
    }
}
