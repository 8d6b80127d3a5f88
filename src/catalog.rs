//! Built-in catalog of art styles.
//!
//! The catalog is compiled in and ordered; the first entry is the default
//! selection of a fresh session.

use serde::Serialize;

/// A named, pre-authored instruction describing a target artistic rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleDefinition {
    /// Stable identifier, unique within the catalog.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Short description shown next to the name.
    pub description: &'static str,
    /// Icon glyph.
    pub icon: &'static str,
    /// Transformation instruction sent to the model.
    pub prompt: &'static str,
}

/// The reference catalog, in display order.
pub static ART_STYLES: [StyleDefinition; 10] = [
    StyleDefinition {
        id: "watercolor",
        name: "水彩画",
        description: "柔和的色彩交织与流动的笔触",
        icon: "🎨",
        prompt: "Transform this image into a beautiful watercolor painting with soft edges, fluid colors, and delicate textures while keeping the main subjects recognizable.",
    },
    StyleDefinition {
        id: "cyberpunk",
        name: "赛博朋克",
        description: "霓虹闪烁的未来都市质感",
        icon: "🌃",
        prompt: "Transform this image into a cyberpunk aesthetic. Add neon lights, high-tech elements, gritty atmosphere, and vibrant pink/cyan color grading.",
    },
    StyleDefinition {
        id: "anime",
        name: "动漫",
        description: "日系动漫清新唯美画风",
        icon: "🌸",
        prompt: "Convert this image into a high-quality Japanese anime style illustration with clean line art, vibrant colors, and cinematic lighting.",
    },
    StyleDefinition {
        id: "chinese-style",
        name: "中国风",
        description: "古风雅韵，东方美学艺术",
        icon: "🧧",
        prompt: "Apply a traditional Chinese artistic style to this image, emphasizing classical elegance, traditional patterns, and balanced compositions.",
    },
    StyleDefinition {
        id: "2d",
        name: "二次元",
        description: "可爱激萌的二次元平面风格",
        icon: "✨",
        prompt: "Transform this image into a cute 2D moe-style illustration, flat coloring, and stylized character features.",
    },
    StyleDefinition {
        id: "3d",
        name: "3D渲染",
        description: "立体写实的精美3D建模感",
        icon: "🧊",
        prompt: "Re-imagine this image as a high-end 3D character or scene render, similar to Pixar or Octane render style, with smooth surfaces and global illumination.",
    },
    StyleDefinition {
        id: "ink-wash",
        name: "水墨画",
        description: "传统写意水墨，黑白晕染",
        icon: "🖋️",
        prompt: "Convert this image into a traditional Chinese ink wash painting (Shui-mo) style, using expressive brushstrokes and minimalist ink gradients.",
    },
    StyleDefinition {
        id: "american-comic",
        name: "美漫",
        description: "美式英雄漫画硬核风格",
        icon: "💥",
        prompt: "Transform this image into an American comic book style with bold black outlines, dramatic shadows, and dynamic action aesthetics.",
    },
    StyleDefinition {
        id: "photography",
        name: "真实摄影",
        description: "电影级真实感艺术摄影",
        icon: "📷",
        prompt: "Enhance this image to look like a professional 8k artistic photograph with cinematic lighting, shallow depth of field, and hyper-realistic details.",
    },
    StyleDefinition {
        id: "oil-painting",
        name: "油画",
        description: "古典大师级别的厚涂油画",
        icon: "🖌️",
        prompt: "Transform this image into a classic oil painting with visible thick brushstrokes, rich textures, and dramatic chiaroscuro lighting.",
    },
];

/// Returns every style in display order.
pub fn styles() -> &'static [StyleDefinition] {
    &ART_STYLES
}

/// Looks up a style by id.
pub fn find(id: &str) -> Option<&'static StyleDefinition> {
    ART_STYLES.iter().find(|s| s.id == id)
}

/// The style a fresh session starts with.
pub fn default_style() -> &'static StyleDefinition {
    &ART_STYLES[0]
}
