use crate::{
    bottleneck::ResidualBottleneck, c3k::C3k, c3k2::C3k2, common::*, conv_block::ConvBlock,
    detect_head::DetectHead, prediction::RawPrediction, sppf::Sppf,
};

pub use block_::*;
mod block_ {
    use super::*;

    #[derive(Debug, AsRefStr)]
    pub enum Block {
        Conv(ConvBlock),
        Bottleneck(ResidualBottleneck),
        C3k(C3k),
        C3k2(C3k2),
        Sppf(Sppf),
        DetectHead(DetectHead),
    }

    impl Block {
        pub fn forward<'a>(&self, input: impl Into<BlockInput<'a>>) -> Result<BlockOutput> {
            let input = input.into();

            let output: BlockOutput = match self {
                Self::Conv(block) => input.single(self.as_ref())?.apply(block).into(),
                Self::Bottleneck(block) => input.single(self.as_ref())?.apply(block).into(),
                Self::C3k(block) => input.single(self.as_ref())?.apply(block).into(),
                Self::C3k2(block) => input.single(self.as_ref())?.apply(block).into(),
                Self::Sppf(block) => input.single(self.as_ref())?.apply(block).into(),
                Self::DetectHead(block) => block.forward(input.indexed(self.as_ref())?)?.into(),
            };

            Ok(output)
        }
    }

    impl From<ConvBlock> for Block {
        fn from(v: ConvBlock) -> Self {
            Self::Conv(v)
        }
    }

    impl From<ResidualBottleneck> for Block {
        fn from(v: ResidualBottleneck) -> Self {
            Self::Bottleneck(v)
        }
    }

    impl From<C3k> for Block {
        fn from(v: C3k) -> Self {
            Self::C3k(v)
        }
    }

    impl From<C3k2> for Block {
        fn from(v: C3k2) -> Self {
            Self::C3k2(v)
        }
    }

    impl From<Sppf> for Block {
        fn from(v: Sppf) -> Self {
            Self::Sppf(v)
        }
    }

    impl From<DetectHead> for Block {
        fn from(v: DetectHead) -> Self {
            Self::DetectHead(v)
        }
    }
}

pub use block_input::*;
mod block_input {
    use super::*;

    #[derive(Debug, Clone)]
    pub enum BlockInput<'a> {
        Single(&'a Tensor),
        Indexed(Vec<&'a Tensor>),
    }

    impl<'a> BlockInput<'a> {
        pub fn tensor(&self) -> Option<&'a Tensor> {
            match *self {
                Self::Single(tensor) => Some(tensor),
                _ => None,
            }
        }

        pub fn indexed_tensor(&self) -> Option<&[&'a Tensor]> {
            match self {
                Self::Indexed(tensors) => Some(tensors.as_slice()),
                _ => None,
            }
        }

        pub(crate) fn single(&self, block: &str) -> Result<&'a Tensor> {
            self.tensor()
                .ok_or_else(|| format_err!("{} block expects a single tensor input", block))
        }

        pub(crate) fn indexed(&self, block: &str) -> Result<&[&'a Tensor]> {
            self.indexed_tensor()
                .ok_or_else(|| format_err!("{} block expects indexed tensor inputs", block))
        }
    }

    impl<'a> From<&'a Tensor> for BlockInput<'a> {
        fn from(from: &'a Tensor) -> Self {
            Self::Single(from)
        }
    }

    impl<'a, 'b> From<&'b [&'a Tensor]> for BlockInput<'a> {
        fn from(from: &'b [&'a Tensor]) -> Self {
            Self::Indexed(from.to_vec())
        }
    }

    impl<'a> From<&'a [Tensor]> for BlockInput<'a> {
        fn from(from: &'a [Tensor]) -> Self {
            Self::Indexed(from.iter().collect())
        }
    }
}

pub use block_output::*;
mod block_output {
    use super::*;

    #[derive(Debug, TensorLike)]
    pub enum BlockOutput {
        Tensor(Tensor),
        Prediction(RawPrediction),
    }

    impl BlockOutput {
        pub fn tensor(self) -> Option<Tensor> {
            match self {
                Self::Tensor(tensor) => Some(tensor),
                _ => None,
            }
        }

        pub fn prediction(self) -> Option<RawPrediction> {
            match self {
                Self::Prediction(prediction) => Some(prediction),
                _ => None,
            }
        }
    }

    impl From<Tensor> for BlockOutput {
        fn from(v: Tensor) -> Self {
            Self::Tensor(v)
        }
    }

    impl From<RawPrediction> for BlockOutput {
        fn from(v: RawPrediction) -> Self {
            Self::Prediction(v)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConvBlockInit, DetectHeadInit, DetectLayerInit};
    use tch::kind::FLOAT_CPU;

    #[test]
    fn dispatch_by_input_kind() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let root = vs.root();

        let conv: Block = ConvBlockInit::new(3, 4, 3).build(&root / "conv")?.into();
        let head: Block = DetectHeadInit {
            num_classes: 2,
            layers: vec![DetectLayerInit {
                in_c: 4,
                anchors: vec![WH::from_wh([0.5, 0.5])],
            }],
        }
        .build(&root / "head")?
        .into();
        assert_eq!(head.as_ref(), "DetectHead");

        let xs = Tensor::randn(&[1, 3, 4, 4], FLOAT_CPU);
        let features = conv
            .forward(&xs)?
            .tensor()
            .ok_or_else(|| format_err!("expect a tensor"))?;
        assert!(conv.forward(&[&xs][..]).is_err());

        let prediction = head
            .forward(&[&features][..])?
            .prediction()
            .ok_or_else(|| format_err!("expect a prediction"))?;
        assert_eq!(prediction.tensor().size(), vec![1, 16, 7]);
        assert!(head.forward(&features).is_err());
        Ok(())
    }
}
