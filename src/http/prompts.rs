use crate::language::Language;

/// Speech hints passed to `<Gather>`
pub const GATHER_HINTS: &str =
    "hello, hi, how are you, thank you, goodbye, namaste, kaise ho, dhanyawad, alvida";

/// Fixed phrases spoken to callers with `<Say>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Greeting,
    Connecting,
    ReceiverConnected,
    ConferenceJoining,
    ConferenceJoined,
    NotConfigured,
    SelfForward,
    RecordPrompt,
    GatherPrompt,
    NoSpeech,
    YouSaid,
    Translation,
    SayMore,
    Goodbye,
    Error,
}

impl Prompt {
    pub fn text(&self, language: Language) -> &'static str {
        match language {
            Language::English => self.english(),
            Language::Hindi => self.hindi(),
        }
    }

    fn english(&self) -> &'static str {
        match self {
            Prompt::Greeting => "Hello! Translation service is ready.",
            Prompt::Connecting => "Connecting you with real-time translation. Please wait.",
            Prompt::ReceiverConnected => "You are connected to the call. Translation is on.",
            Prompt::ConferenceJoining => "Connecting you to conference.",
            Prompt::ConferenceJoined => "You are now connected to the caller.",
            Prompt::NotConfigured => "Sorry, forwarding number not configured.",
            Prompt::SelfForward => "Sorry, this call cannot be forwarded to the same number.",
            Prompt::RecordPrompt => {
                "Please speak after this message. Press hash when you are done."
            }
            Prompt::GatherPrompt => "Hello! Please speak clearly for translation.",
            Prompt::NoSpeech => "I didn't hear anything clearly. Please try again.",
            Prompt::YouSaid => "You said:",
            Prompt::Translation => "Translation:",
            Prompt::SayMore => "Would you like to say something else?",
            Prompt::Goodbye => "Thank you. Goodbye.",
            Prompt::Error => "Sorry, something went wrong. Please try again later.",
        }
    }

    fn hindi(&self) -> &'static str {
        match self {
            Prompt::Greeting => "नमस्ते! अनुवाद सेवा तैयार है।",
            Prompt::Connecting => "आपको अनुवाद के साथ जोड़ा जा रहा है। कृपया प्रतीक्षा करें।",
            Prompt::ReceiverConnected => "आप कॉल से जुड़ गए हैं। अनुवाद चालू है।",
            Prompt::ConferenceJoining => "आपको कॉन्फ्रेंस से जोड़ा जा रहा है।",
            Prompt::ConferenceJoined => "आप कॉलर से जुड़ गए हैं।",
            Prompt::NotConfigured => "क्षमा करें, फॉरवर्डिंग नंबर सेट नहीं है।",
            Prompt::SelfForward => "क्षमा करें, यह कॉल उसी नंबर पर फॉरवर्ड नहीं की जा सकती।",
            Prompt::RecordPrompt => "कृपया इस संदेश के बाद बोलें। समाप्त होने पर हैश दबाएं।",
            Prompt::GatherPrompt => "नमस्ते! कृपया अनुवाद के लिए साफ़ बोलें।",
            Prompt::NoSpeech => "मुझे कुछ साफ़ सुनाई नहीं दिया। कृपया फिर से कोशिश करें।",
            Prompt::YouSaid => "आपने कहा:",
            Prompt::Translation => "अनुवाद:",
            Prompt::SayMore => "क्या आप कुछ और कहना चाहेंगे?",
            Prompt::Goodbye => "धन्यवाद। अलविदा।",
            Prompt::Error => "क्षमा करें, कुछ गलत हो गया। कृपया बाद में कोशिश करें।",
        }
    }
}
