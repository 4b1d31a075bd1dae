pub mod analysis;
pub mod ask;
pub mod live;

use std::collections::HashMap;

use crate::component::Component;
use crate::screen::ScreenId;

/// Create all screen components.
pub fn create_screens() -> HashMap<ScreenId, Box<dyn Component>> {
    let mut screens: HashMap<ScreenId, Box<dyn Component>> = HashMap::new();
    screens.insert(ScreenId::Live, Box::new(live::LiveScreen::new()));
    screens.insert(ScreenId::Analysis, Box::new(analysis::AnalysisScreen::new()));
    screens.insert(ScreenId::Ask, Box::new(ask::AskScreen::new()));
    screens
}
