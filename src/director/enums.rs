use num_derive::FromPrimitive;

#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive)]
pub enum MemberType {
    Null = 0,
    Bitmap = 1,
    FilmLoop = 2,
    Text = 3,
    Palette = 4,
    Picture = 5,
    Sound = 6,
    Button = 7,
    Shape = 8,
    Movie = 9,
    DigitalVideo = 10,
    Script = 11,
    RichText = 12,
    Ole = 13,
    Transition = 14,
    Xtra = 15,
}

/// Script kind selector stored in a script member's specific data.
#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive)]
pub enum ScriptFormat {
    Unknown = 0,
    Behavior = 1,
    Movie = 3,
    Parent = 7,
}

impl ScriptFormat {
    pub fn selector(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            ScriptFormat::Unknown => "unknown",
            ScriptFormat::Behavior => "behavior",
            ScriptFormat::Movie => "movie",
            ScriptFormat::Parent => "parent",
        }
    }
}
