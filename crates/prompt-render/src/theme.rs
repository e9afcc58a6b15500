//! Color assignments for the rendered prompt.

use prompt_term::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub prefix_text: Color,
    pub prefix_bg: Color,
    pub input_text: Color,
    pub input_bg: Color,
    pub suggestion_text: Color,
    pub suggestion_bg: Color,
    pub selected_suggestion_text: Color,
    pub selected_suggestion_bg: Color,
    pub description_text: Color,
    pub description_bg: Color,
    pub selected_description_text: Color,
    pub selected_description_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            prefix_text: Color::Blue,
            prefix_bg: Color::DefaultColor,
            input_text: Color::DefaultColor,
            input_bg: Color::DefaultColor,
            suggestion_text: Color::White,
            suggestion_bg: Color::Cyan,
            selected_suggestion_text: Color::Black,
            selected_suggestion_bg: Color::LightGray,
            description_text: Color::Black,
            description_bg: Color::Turquoise,
            selected_description_text: Color::White,
            selected_description_bg: Color::Cyan,
        }
    }
}
