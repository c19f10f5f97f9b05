//! Semantic control roles and the static role → sound file table.

use std::fmt;

/// Semantic classification of a UI control.
///
/// Only roles listed in [`SOUND_ASSETS`] have a cue; the rest are silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Animation,
    Button,
    Chart,
    Checkbox,
    CheckMenuItem,
    Clock,
    ComboBox,
    DesktopIcon,
    Diagram,
    Dial,
    DropDownButton,
    DropDownButtonGrid,
    DropList,
    EditableText,
    Graphic,
    HotkeyField,
    Icon,
    ImageMap,
    Indicator,
    Link,
    ListItem,
    Menu,
    MenuBar,
    MenuButton,
    MenuItem,
    PasswordEdit,
    RadioButton,
    RadioMenuItem,
    RichEdit,
    Shape,
    Slider,
    SpinButton,
    SplitButton,
    StaticText,
    Tab,
    TabControl,
    TearOffMenu,
    ToggleButton,
    TreeViewButton,
    TreeViewItem,

    // Roles without a cue
    Document,
    Grouping,
    Heading,
    List,
    Pane,
    Table,
    Window,
    Unknown,
}

impl Role {
    /// Stable lowercase name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Role::Animation => "animation",
            Role::Button => "button",
            Role::Chart => "chart",
            Role::Checkbox => "checkbox",
            Role::CheckMenuItem => "check menu item",
            Role::Clock => "clock",
            Role::ComboBox => "combo box",
            Role::DesktopIcon => "desktop icon",
            Role::Diagram => "diagram",
            Role::Dial => "dial",
            Role::DropDownButton => "drop down button",
            Role::DropDownButtonGrid => "drop down button grid",
            Role::DropList => "drop list",
            Role::EditableText => "editable text",
            Role::Graphic => "graphic",
            Role::HotkeyField => "hotkey field",
            Role::Icon => "icon",
            Role::ImageMap => "image map",
            Role::Indicator => "indicator",
            Role::Link => "link",
            Role::ListItem => "list item",
            Role::Menu => "menu",
            Role::MenuBar => "menu bar",
            Role::MenuButton => "menu button",
            Role::MenuItem => "menu item",
            Role::PasswordEdit => "password edit",
            Role::RadioButton => "radio button",
            Role::RadioMenuItem => "radio menu item",
            Role::RichEdit => "rich edit",
            Role::Shape => "shape",
            Role::Slider => "slider",
            Role::SpinButton => "spin button",
            Role::SplitButton => "split button",
            Role::StaticText => "static text",
            Role::Tab => "tab",
            Role::TabControl => "tab control",
            Role::TearOffMenu => "tear off menu",
            Role::ToggleButton => "toggle button",
            Role::TreeViewButton => "tree view button",
            Role::TreeViewItem => "tree view item",
            Role::Document => "document",
            Role::Grouping => "grouping",
            Role::Heading => "heading",
            Role::List => "list",
            Role::Pane => "pane",
            Role::Table => "table",
            Role::Window => "window",
            Role::Unknown => "unknown",
        }
    }

    /// Sound file bound to this role, if any.
    pub fn sound_file(&self) -> Option<&'static str> {
        SOUND_ASSETS
            .iter()
            .find(|asset| asset.role == *self)
            .map(|asset| asset.file)
    }

    /// Whether this role has a cue.
    pub fn has_sound(&self) -> bool {
        self.sound_file().is_some()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable binding of a role to a sound file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundAsset {
    pub role: Role,
    pub file: &'static str,
}

const fn asset(role: Role, file: &'static str) -> SoundAsset {
    SoundAsset { role, file }
}

/// Role → file table. Several roles share one file.
pub static SOUND_ASSETS: &[SoundAsset] = &[
    asset(Role::Checkbox, "checkbox.wav"),
    asset(Role::RadioButton, "radiobutton.wav"),
    asset(Role::StaticText, "editabletext.wav"),
    asset(Role::EditableText, "editabletext.wav"),
    asset(Role::Button, "button.wav"),
    asset(Role::MenuBar, "menuitem.wav"),
    asset(Role::MenuItem, "menuitem.wav"),
    asset(Role::Menu, "menuitem.wav"),
    asset(Role::ComboBox, "combobox.wav"),
    asset(Role::ListItem, "listitem.wav"),
    asset(Role::Graphic, "icon.wav"),
    asset(Role::Link, "link.wav"),
    asset(Role::TreeViewItem, "treeviewitem.wav"),
    asset(Role::Tab, "tab.wav"),
    asset(Role::TabControl, "tab.wav"),
    asset(Role::Slider, "slider.wav"),
    asset(Role::DropDownButton, "combobox.wav"),
    asset(Role::Clock, "clock.wav"),
    asset(Role::Animation, "icon.wav"),
    asset(Role::Icon, "icon.wav"),
    asset(Role::ImageMap, "icon.wav"),
    asset(Role::RadioMenuItem, "radiobutton.wav"),
    asset(Role::RichEdit, "editabletext.wav"),
    asset(Role::Shape, "icon.wav"),
    asset(Role::TearOffMenu, "menuitem.wav"),
    asset(Role::ToggleButton, "checkbox.wav"),
    asset(Role::Chart, "icon.wav"),
    asset(Role::Diagram, "icon.wav"),
    asset(Role::Dial, "slider.wav"),
    asset(Role::DropList, "combobox.wav"),
    asset(Role::MenuButton, "button.wav"),
    asset(Role::DropDownButtonGrid, "button.wav"),
    asset(Role::HotkeyField, "editabletext.wav"),
    asset(Role::Indicator, "icon.wav"),
    asset(Role::SpinButton, "slider.wav"),
    asset(Role::TreeViewButton, "button.wav"),
    asset(Role::DesktopIcon, "icon.wav"),
    asset(Role::PasswordEdit, "editabletext.wav"),
    asset(Role::CheckMenuItem, "checkbox.wav"),
    asset(Role::SplitButton, "splitbutton.wav"),
];

/// Distinct sound file names referenced by [`SOUND_ASSETS`], in table order.
pub fn sound_files() -> Vec<&'static str> {
    let mut files: Vec<&'static str> = Vec::new();
    for asset in SOUND_ASSETS {
        if !files.contains(&asset.file) {
            files.push(asset.file);
        }
    }
    files
}
