use crate::{common::*, conv_block::*};

#[derive(Debug, Clone)]
pub struct ResidualBottleneckInit {
    pub in_c: usize,
    pub out_c: usize,
    /// Ratio of the inner width to the output width.
    pub expansion: R64,
    pub activation: Activation,
}

impl ResidualBottleneckInit {
    pub fn new(in_c: usize, out_c: usize) -> Self {
        Self {
            in_c,
            out_c,
            expansion: r64(0.5),
            activation: Activation::Silu,
        }
    }

    pub fn build<'p, P>(self, path: P) -> Result<ResidualBottleneck>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();

        let Self {
            in_c,
            out_c,
            expansion,
            activation,
        } = self;

        ensure!(
            in_c == out_c,
            "residual bottleneck requires equal input and output channels, but get {} and {}",
            in_c,
            out_c
        );
        ensure!(
            expansion > 0.0,
            "expansion must be positive, but get {}",
            expansion
        );
        let mid_c = ((out_c as f64 * expansion.raw()) as usize).max(1);

        let conv1 = ConvBlockInit {
            activation,
            ..ConvBlockInit::new(in_c, mid_c, 3)
        }
        .build(path / "conv1")?;
        let conv2 = ConvBlockInit {
            activation,
            ..ConvBlockInit::new(mid_c, out_c, 3)
        }
        .build(path / "conv2")?;

        Ok(ResidualBottleneck { conv1, conv2 })
    }
}

/// Two 3x3 convolution blocks with an identity shortcut.
#[derive(Debug)]
pub struct ResidualBottleneck {
    conv1: ConvBlock,
    conv2: ConvBlock,
}

impl ResidualBottleneck {
    pub fn channels(&self) -> usize {
        self.conv1.in_c()
    }
}

impl nn::Module for ResidualBottleneck {
    fn forward(&self, xs: &Tensor) -> Tensor {
        xs + xs.apply(&self.conv1).apply(&self.conv2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::kind::FLOAT_CPU;

    #[test]
    fn bottleneck_keeps_shape() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let block = ResidualBottleneckInit::new(16, 16).build(&vs.root())?;
        assert_eq!(block.channels(), 16);

        let xs = Tensor::randn(&[2, 16, 9, 11], FLOAT_CPU);
        let ys = xs.apply(&block);
        assert_eq!(ys.size(), xs.size());
        Ok(())
    }

    #[test]
    fn reject_mismatched_channels() {
        let vs = nn::VarStore::new(Device::Cpu);
        let result = ResidualBottleneckInit::new(16, 32).build(&vs.root());
        assert!(result.is_err());
    }
}
