//! The pretrained model zoo.
//!
//! Each [`ModelKind`] knows how to build its network on top of a
//! [`tch::nn::Path`], which weight file holds its pretrained parameters and
//! which input it was trained on.
use std::fmt;
use std::str::FromStr;

use tch::nn::{self, ModuleT};
use tch::vision::{
    alexnet, convmixer, densenet, efficientnet, inception, mobilenet, resnet, squeezenet, vgg,
};

use super::transform::{DataConfig, Interpolation};
use crate::{ClassifyError, Result};

/// Architectures with published ImageNet weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    ResNet18,
    ResNet34,
    DenseNet121,
    Vgg13,
    Vgg16,
    Vgg19,
    SqueezeNet1_0,
    SqueezeNet1_1,
    AlexNet,
    InceptionV3,
    MobileNetV2,
    EfficientNetB0,
    EfficientNetB1,
    EfficientNetB2,
    EfficientNetB3,
    EfficientNetB4,
    EfficientNetB5,
    EfficientNetB6,
    EfficientNetB7,
    ConvMixer1536_20,
    ConvMixer1024_20,
}

const MW_RELEASE: &str = "https://github.com/LaurentMazare/tch-rs/releases/download/mw";
const OCAML_TORCH_RELEASE: &str =
    "https://github.com/LaurentMazare/ocaml-torch/releases/download/v0.1-unstable";

impl ModelKind {
    pub const ALL: [ModelKind; 21] = [
        ModelKind::ResNet18,
        ModelKind::ResNet34,
        ModelKind::DenseNet121,
        ModelKind::Vgg13,
        ModelKind::Vgg16,
        ModelKind::Vgg19,
        ModelKind::SqueezeNet1_0,
        ModelKind::SqueezeNet1_1,
        ModelKind::AlexNet,
        ModelKind::InceptionV3,
        ModelKind::MobileNetV2,
        ModelKind::EfficientNetB0,
        ModelKind::EfficientNetB1,
        ModelKind::EfficientNetB2,
        ModelKind::EfficientNetB3,
        ModelKind::EfficientNetB4,
        ModelKind::EfficientNetB5,
        ModelKind::EfficientNetB6,
        ModelKind::EfficientNetB7,
        ModelKind::ConvMixer1536_20,
        ModelKind::ConvMixer1024_20,
    ];

    /// The canonical name, also the stem of the weight file.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::ResNet18 => "resnet18",
            ModelKind::ResNet34 => "resnet34",
            ModelKind::DenseNet121 => "densenet121",
            ModelKind::Vgg13 => "vgg13",
            ModelKind::Vgg16 => "vgg16",
            ModelKind::Vgg19 => "vgg19",
            ModelKind::SqueezeNet1_0 => "squeezenet1_0",
            ModelKind::SqueezeNet1_1 => "squeezenet1_1",
            ModelKind::AlexNet => "alexnet",
            ModelKind::InceptionV3 => "inception-v3",
            ModelKind::MobileNetV2 => "mobilenet-v2",
            ModelKind::EfficientNetB0 => "efficientnet-b0",
            ModelKind::EfficientNetB1 => "efficientnet-b1",
            ModelKind::EfficientNetB2 => "efficientnet-b2",
            ModelKind::EfficientNetB3 => "efficientnet-b3",
            ModelKind::EfficientNetB4 => "efficientnet-b4",
            ModelKind::EfficientNetB5 => "efficientnet-b5",
            ModelKind::EfficientNetB6 => "efficientnet-b6",
            ModelKind::EfficientNetB7 => "efficientnet-b7",
            ModelKind::ConvMixer1536_20 => "convmixer1536_20",
            ModelKind::ConvMixer1024_20 => "convmixer1024_20",
        }
    }

    pub fn weight_file_name(&self) -> String {
        format!("{}.ot", self.name())
    }

    /// Where the pretrained weights are published.
    pub fn weight_url(&self) -> String {
        let release = match self {
            ModelKind::EfficientNetB0
            | ModelKind::EfficientNetB1
            | ModelKind::EfficientNetB2
            | ModelKind::EfficientNetB3
            | ModelKind::EfficientNetB4
            | ModelKind::EfficientNetB5
            | ModelKind::EfficientNetB6
            | ModelKind::EfficientNetB7
            | ModelKind::ConvMixer1536_20
            | ModelKind::ConvMixer1024_20 => OCAML_TORCH_RELEASE,
            _ => MW_RELEASE,
        };
        format!("{}/{}", release, self.weight_file_name())
    }

    /// Creates the network with freshly initialized variables under `p`.
    pub fn build(&self, p: &nn::Path, nclasses: i64) -> Box<dyn ModuleT> {
        match self {
            ModelKind::ResNet18 => Box::new(resnet::resnet18(p, nclasses)),
            ModelKind::ResNet34 => Box::new(resnet::resnet34(p, nclasses)),
            ModelKind::DenseNet121 => Box::new(densenet::densenet121(p, nclasses)),
            ModelKind::Vgg13 => Box::new(vgg::vgg13(p, nclasses)),
            ModelKind::Vgg16 => Box::new(vgg::vgg16(p, nclasses)),
            ModelKind::Vgg19 => Box::new(vgg::vgg19(p, nclasses)),
            ModelKind::SqueezeNet1_0 => Box::new(squeezenet::v1_0(p, nclasses)),
            ModelKind::SqueezeNet1_1 => Box::new(squeezenet::v1_1(p, nclasses)),
            ModelKind::AlexNet => Box::new(alexnet::alexnet(p, nclasses)),
            ModelKind::InceptionV3 => Box::new(inception::v3(p, nclasses)),
            ModelKind::MobileNetV2 => Box::new(mobilenet::v2(p, nclasses)),
            ModelKind::EfficientNetB0 => Box::new(efficientnet::b0(p, nclasses)),
            ModelKind::EfficientNetB1 => Box::new(efficientnet::b1(p, nclasses)),
            ModelKind::EfficientNetB2 => Box::new(efficientnet::b2(p, nclasses)),
            ModelKind::EfficientNetB3 => Box::new(efficientnet::b3(p, nclasses)),
            ModelKind::EfficientNetB4 => Box::new(efficientnet::b4(p, nclasses)),
            ModelKind::EfficientNetB5 => Box::new(efficientnet::b5(p, nclasses)),
            ModelKind::EfficientNetB6 => Box::new(efficientnet::b6(p, nclasses)),
            ModelKind::EfficientNetB7 => Box::new(efficientnet::b7(p, nclasses)),
            ModelKind::ConvMixer1536_20 => Box::new(convmixer::c1536_20(p, nclasses)),
            ModelKind::ConvMixer1024_20 => Box::new(convmixer::c1024_20(p, nclasses)),
        }
    }

    /// The preprocessing the weights were trained with.
    pub fn data_config(&self) -> DataConfig {
        let (size, crop_pct) = match self {
            ModelKind::InceptionV3 => (299, 0.875),
            ModelKind::EfficientNetB1 => (240, 0.882),
            ModelKind::EfficientNetB2 => (260, 0.890),
            ModelKind::EfficientNetB3 => (300, 0.904),
            ModelKind::EfficientNetB4 => (380, 0.922),
            ModelKind::EfficientNetB5 => (456, 0.934),
            ModelKind::EfficientNetB6 => (528, 0.942),
            ModelKind::EfficientNetB7 => (600, 0.949),
            ModelKind::ConvMixer1536_20 | ModelKind::ConvMixer1024_20 => (224, 0.96),
            _ => (224, 0.875),
        };
        let interpolation = match self {
            ModelKind::EfficientNetB0
            | ModelKind::EfficientNetB1
            | ModelKind::EfficientNetB2
            | ModelKind::EfficientNetB3
            | ModelKind::EfficientNetB4
            | ModelKind::EfficientNetB5
            | ModelKind::EfficientNetB6
            | ModelKind::EfficientNetB7
            | ModelKind::ConvMixer1536_20
            | ModelKind::ConvMixer1024_20 => Interpolation::Bicubic,
            _ => Interpolation::Bilinear,
        };
        DataConfig { input_size: (3, size, size), crop_pct, interpolation, ..DataConfig::default() }
    }

    /// Smallest and largest input height (or width) the network can run on.
    pub fn input_size_range(&self) -> (u32, u32) {
        match self {
            // The classifier heads expect a 7x7 feature map.
            ModelKind::Vgg13 | ModelKind::Vgg16 | ModelKind::Vgg19 => (224, 255),
            ModelKind::DenseNet121 => (221, 252),
            ModelKind::AlexNet => (63, u32::MAX),
            ModelKind::InceptionV3 => (75, u32::MAX),
            _ => (32, u32::MAX),
        }
    }

    pub fn accepts_input_size(&self, height: i64, width: i64) -> bool {
        let (min, max) = self.input_size_range();
        let range = i64::from(min)..=i64::from(max);
        range.contains(&height) && range.contains(&width)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self> {
        // Accept the weight file name too, e.g. "resnet18.ot".
        let name = s.trim().strip_suffix(".ot").unwrap_or(s.trim());
        let kind = ModelKind::ALL.iter().find(|kind| kind.name().eq_ignore_ascii_case(name));
        kind.copied().ok_or_else(|| ClassifyError::UnknownModel {
            name: s.to_string(),
            known: ModelKind::ALL.iter().map(|k| k.name()).collect::<Vec<_>>().join(", "),
        })
    }
}
