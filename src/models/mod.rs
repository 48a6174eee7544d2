mod component;
mod day_of_week;
mod favorite;
mod meal_slot;
mod meal_type;
mod template;

pub use component::{Component, Nutrition};
pub use day_of_week::DayOfWeek;
pub use favorite::FavoriteMeal;
pub use meal_slot::{MealSlot, SlotPatch};
pub use meal_type::MealType;
pub use template::{
    ComponentRef, MealContent, PrepComponent, Template, TemplateDay, TemplateMeal,
};
