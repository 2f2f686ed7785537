use once_cell::sync::Lazy;

use crate::models::{Exercise, Workout};
use crate::types::{Category, Difficulty};

/// The built-in workout registry. Read-only at runtime: sessions copy what
/// they need at creation and never reach back into this table afterwards.
static WORKOUTS: Lazy<Vec<Workout>> = Lazy::new(|| {
    vec![
        Workout {
            id: "1",
            name: "Full Body Strength",
            description: "A comprehensive strength training workout targeting all major muscle groups",
            category: Category::Strength,
            difficulty: Difficulty::Intermediate,
            duration: 45,
            image: "https://images.unsplash.com/photo-1534438327276-14e5300c3a48?auto=format&fit=crop&q=80",
            exercises: vec![
                Exercise {
                    id: "e1",
                    name: "Squats",
                    sets: 3,
                    reps: 12,
                    rest_time: 60,
                    image: "https://images.unsplash.com/photo-1566241142559-40a9552c8a76?auto=format&fit=crop&q=80",
                },
                Exercise {
                    id: "e2",
                    name: "Push-ups",
                    sets: 3,
                    reps: 15,
                    rest_time: 45,
                    image: "https://images.unsplash.com/photo-1616803689943-5601631c7fec?auto=format&fit=crop&q=80",
                },
            ],
        },
        Workout {
            id: "2",
            name: "HIIT Cardio Blast",
            description: "High-intensity interval training to boost cardiovascular fitness",
            category: Category::Cardio,
            difficulty: Difficulty::Advanced,
            duration: 30,
            image: "https://images.unsplash.com/photo-1517963879433-6ad2b056d712?auto=format&fit=crop&q=80",
            exercises: vec![
                Exercise {
                    id: "e3",
                    name: "Burpees",
                    sets: 4,
                    reps: 15,
                    rest_time: 30,
                    image: "https://images.unsplash.com/photo-1576678927484-cc907957088c?auto=format&fit=crop&q=80",
                },
                Exercise {
                    id: "e4",
                    name: "Mountain Climbers",
                    sets: 3,
                    reps: 20,
                    rest_time: 30,
                    image: "https://images.unsplash.com/photo-1598971639058-fab3c3109a00?auto=format&fit=crop&q=80",
                },
            ],
        },
        Workout {
            id: "3",
            name: "Flexibility Flow",
            description: "Improve flexibility and mobility with this dynamic stretching routine",
            category: Category::Flexibility,
            difficulty: Difficulty::Beginner,
            duration: 20,
            image: "https://images.unsplash.com/photo-1544367567-0f2fcb009e0b?auto=format&fit=crop&q=80",
            exercises: vec![
                Exercise {
                    id: "e5",
                    name: "Dynamic Stretches",
                    sets: 3,
                    reps: 10,
                    rest_time: 30,
                    image: "https://images.unsplash.com/photo-1518611012118-696072aa579a?auto=format&fit=crop&q=80",
                },
                Exercise {
                    id: "e6",
                    name: "Yoga Flow",
                    sets: 2,
                    reps: 8,
                    rest_time: 20,
                    image: "https://images.unsplash.com/photo-1544367567-0f2fcb009e0b?auto=format&fit=crop&q=80",
                },
            ],
        },
    ]
});

pub fn all() -> &'static [Workout] {
    &WORKOUTS
}

pub fn find(id: &str) -> Option<&'static Workout> {
    WORKOUTS.iter().find(|w| w.id == id)
}

pub fn find_by_name(name: &str) -> Option<&'static Workout> {
    WORKOUTS.iter().find(|w| w.name.eq_ignore_ascii_case(name))
}

pub fn by_category(category: Category) -> impl Iterator<Item = &'static Workout> {
    WORKOUTS.iter().filter(move |w| w.category == category)
}
